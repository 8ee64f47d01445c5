//! Prebuilt resolution paths: the compiled queries consumers (navigation,
//! find-usages, inspections) run against the workspace.
//!
//! Each constructor validates its string inputs and degrades to the empty
//! path on malformed names, so a bad reference in source text navigates to
//! an empty set instead of failing.

mod delegates;
mod namespaces;
mod params;
mod templates;

pub use delegates::{deltemplate_definition, deltemplate_in_package, resolve_delcall_target};
pub use namespaces::{namespace_alias_sites, namespace_declaration};
pub use params::{
    call_params_declared_by_target, declared_names_of, declared_params, param_usages,
    resolve_var_ref,
};
pub use templates::{
    any_template_named, call_target_path, resolve_call_target, template_definition,
};
