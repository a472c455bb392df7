pub mod merge;
pub mod model;
pub mod validate;

pub use merge::{aggregate, AggregateReply, CallResult, MergeError};
pub use model::{
    call_token, A2uiData, Action, ActionContext, ChartDataPoint, ChatResponse, Component,
    ComponentEntry, DataModelEntry, Fragment, Surface, TextContent,
};
pub use validate::{validate_fragment, ValidationError};
