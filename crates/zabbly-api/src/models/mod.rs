//! Wire objects mirroring the remote API's JSON shape.
//!
//! Identifiers and enumerated codes are kept as strings, which is how the
//! API echoes them. Fields only meaningful for some object variants are
//! `Option`s so that a builder leaving them unset keeps them out of the
//! payload entirely.

pub(crate) mod de;

mod graph;
mod host;
mod item;
mod trigger;

pub use graph::{Graph, GraphItem};
pub use host::{
    Application, GroupId, Host, HostGroup, HostInterface, InterfaceDetails, Macro, Proxy, Template,
    TemplateId,
};
pub use item::{
    Check, FilterCondition, HttpCheck, Item, LldFilter, LldRule, MacroPath, Preprocessor, RuleRef,
    SnmpCheck,
};
pub use trigger::{Tag, Trigger, TriggerRef};
