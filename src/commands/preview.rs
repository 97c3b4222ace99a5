use crate::eval::grid::{height_range, heights, GridSpec};
use crate::eval::surface::{Pointer, SurfaceEngine};
use crate::schema::SurfaceSettings;
use serde::{Deserialize, Serialize};

/// Default side length of the preview plane.
pub const DEFAULT_WIDTH: f64 = 20.0;

fn default_width() -> f64 {
    DEFAULT_WIDTH
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    /// Full settings object; missing keys take their defaults.
    #[serde(default)]
    pub settings: SurfaceSettings,
    /// Overrides `settings.resolution` when present.
    #[serde(default)]
    pub resolution: Option<u32>,
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default)]
    pub time: f64,
    #[serde(default)]
    pub pointer: Pointer,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    /// One height per vertex, in position-buffer order.
    pub heights: Vec<f32>,
    pub resolution: u32,
    pub min_value: f32,
    pub max_value: f32,
}

/// Render a single frame of the configured surface on a fresh grid.
pub fn preview_surface(request: PreviewRequest) -> Result<PreviewResponse, String> {
    let mut engine = SurfaceEngine::new();
    preview_with(&mut engine, request)
}

/// Same as [`preview_surface`] but reuses an engine, so its equation cache
/// and rejection set carry over between calls.
pub fn preview_with(
    engine: &mut SurfaceEngine,
    request: PreviewRequest,
) -> Result<PreviewResponse, String> {
    let resolution = request.resolution.unwrap_or(request.settings.resolution);
    if resolution == 0 {
        return Err("Resolution must be at least 1".into());
    }
    if !(request.width.is_finite() && request.width > 0.0) {
        return Err(format!("Invalid width: {}", request.width));
    }

    let params = request.settings.field_params();
    let grid = GridSpec::new(resolution, request.width);
    let mut buffer = grid.build_buffer();
    engine.update(&mut buffer, request.time, request.pointer, grid, &params);

    let (min_value, max_value) = height_range(&buffer);
    Ok(PreviewResponse {
        heights: heights(&buffer),
        resolution,
        min_value,
        max_value,
    })
}

/// Compile a custom equation against the given variables without rendering.
pub fn validate_equation(
    engine: &mut SurfaceEngine,
    equation: &str,
    settings: &SurfaceSettings,
) -> Result<(), String> {
    engine
        .compiler_mut()
        .compile(equation, &settings.equation_variables)
        .map(|_| ())
        .map_err(|e| format!("Equation error: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::registry::FieldKind;
    use serde_json::json;

    fn calm_settings(kind: FieldKind) -> SurfaceSettings {
        SurfaceSettings {
            math_function: kind,
            turbulence: 0.0,
            ..SurfaceSettings::default()
        }
    }

    #[test]
    fn preview_returns_one_height_per_vertex() {
        let response = preview_surface(PreviewRequest {
            settings: calm_settings(FieldKind::Waves),
            resolution: Some(8),
            width: 10.0,
            time: 1.5,
            pointer: Pointer::default(),
        })
        .unwrap();
        assert_eq!(response.resolution, 8);
        assert_eq!(response.heights.len(), 81);
        assert!(response.min_value <= response.max_value);
        assert!(response.heights.iter().all(|h| h.is_finite()));
    }

    #[test]
    fn zero_resolution_is_rejected() {
        let result = preview_surface(PreviewRequest {
            settings: SurfaceSettings::default(),
            resolution: Some(0),
            width: 10.0,
            time: 0.0,
            pointer: Pointer::default(),
        });
        assert!(result.is_err());
    }

    #[test]
    fn request_deserializes_with_defaults() {
        let request: PreviewRequest = serde_json::from_value(json!({
            "settings": { "mathFunction": "ripples", "resolution": 4 },
            "time": 2.0
        }))
        .unwrap();
        assert_eq!(request.settings.math_function, FieldKind::Ripples);
        assert_eq!(request.width, DEFAULT_WIDTH);

        let response = preview_surface(request).unwrap();
        assert_eq!(response.heights.len(), 25);
    }

    #[test]
    fn response_serializes_camel_case() {
        let response = PreviewResponse {
            heights: vec![1.0],
            resolution: 1,
            min_value: 1.0,
            max_value: 1.0,
        };
        let v = serde_json::to_value(&response).unwrap();
        assert!(v.get("minValue").is_some());
        assert!(v.get("maxValue").is_some());
    }

    #[test]
    fn validate_reports_bad_equations() {
        let mut engine = SurfaceEngine::new();
        let settings = SurfaceSettings::default();
        assert!(validate_equation(&mut engine, "A * sin(x)", &settings).is_ok());
        let err = validate_equation(&mut engine, "eval(x)", &settings).unwrap_err();
        assert!(err.starts_with("Equation error"));
    }
}
