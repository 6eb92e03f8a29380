//! FILENAME: core/style-engine/src/lib.rs
//! Chunked styling and validation engine for virtual table views.
//!
//! Large tables are shown chunk by chunk, but styling functions are written
//! to run once over the whole table. This crate restricts each styling
//! directive to a chunk while still feeding it the subset-wide context it
//! needs, and checks empirically which directives survive chunking.
//!
//! Layers:
//! - `region`, `value`, `table`, `view`: coordinates, raw data and the
//!   virtual (sorted/filtered/hidden) view over a source table
//! - `style_func`, `builtins`, `todo`: styling callables and directives
//! - `patcher`, `compute`, `css`: chunk restriction and style computation
//! - `meta`, `frame`, `validator`, `info`: response records
//! - `context`: the per-view arena owning every cache

pub mod builtins;
pub mod colormap;
pub mod compute;
pub mod config;
pub mod context;
pub mod css;
pub mod describe;
pub mod error;
pub mod frame;
pub mod info;
pub mod meta;
pub mod patcher;
pub mod region;
pub mod style_func;
pub mod table;
pub mod todo;
pub mod validator;
pub mod value;
pub mod view;

pub use config::EngineConfig;
pub use context::{TableStructure, TableViewContext};
pub use css::{CssDeclaration, StyleContext};
pub use error::{EngineError, EngineResult, StyleError};
pub use frame::{
    CellFormatter, ChunkData, ChunkDataGenerator, DisplayFormatter, GeneratorContext, TableFrame,
    TableFrameCell, TableFrameColumn, TableFrameGenerator, TableFrameLegend,
};
pub use info::StyleFunctionInfo;
pub use meta::{CellMeta, MetaComputer};
pub use patcher::{AggregateCache, ChunkParentProvider, PatcherKind, SubsetParent, TodoPatcher};
pub use region::Region;
pub use style_func::{
    Axis, BuiltinStyle, Frame, KwValue, Kwargs, Series, StyleCallable, StyleData, StyleOutput,
    CHUNK_PARENT_PARAM,
};
pub use table::{DataTable, SourceTable};
pub use todo::{StyleRegistry, StylingDirectiveRegistry, Subset, Todo, TodoBuilder, TodoKind};
pub use validator::{
    FastValidationStrategy, PrecisionValidationStrategy, ProblemReason, ValidationProblem,
    ValidationStrategy, ValidationStrategyType,
};
pub use value::{CellValue, DType};
pub use view::{Chunk, FilterCriteria, Visibility, VirtualTableView};
