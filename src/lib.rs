pub mod commands;
pub mod error;
pub mod eval;
pub mod schema;

pub use commands::preview::{preview_surface, PreviewRequest, PreviewResponse};
pub use error::{CompileError, ParseError, SettingsError};
pub use eval::cache::{equation_templates, EquationCompiler, EQUATION_TEMPLATES};
pub use eval::grid::GridSpec;
pub use eval::registry::{describe, select, select_id, FieldKind};
pub use eval::surface::{AnimationMode, FieldParams, Pointer, PointerTracker, SurfaceEngine};
pub use schema::SurfaceSettings;
