//! Compiles the signature procedure out of a player script.
//!
//! The script is never executed. The builder looks for the one idiom the site
//! uses: a top-level function that splits the signature into an array, calls
//! helpers of a single object literal on it, and joins it back. Each helper is
//! one of three operations, recognized by its body rather than its name since
//! names are re-obfuscated with every script build.

use std::{collections::HashMap, sync::LazyLock};

use regex::Regex;
use tracing::trace;

use super::program::{Transform, TransformKind, TransformProgram};
use crate::common::errors::ExtractionError;

static FUNC_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"signature",\s?([a-zA-Z0-9$]+)\("#).unwrap());

static OPERATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+?\.(\w{2})\(\w,([0-9]+)\)").unwrap());

/// Runs every stage and assembles the program.
pub fn build_program(script: &str) -> Result<TransformProgram, ExtractionError> {
    let func_name = extract_function_name(script)?;
    let procedure = extract_procedure(&func_name, script)?;
    let helper_name = helper_object_name(&func_name, &procedure)?;
    let helpers = extract_helpers(&helper_name, script)?;
    let kinds = classify_helpers(&helpers);

    let mut transforms = Vec::with_capacity(procedure.len());
    for call in &procedure {
        transforms.push(resolve_call(call, &kinds)?);
    }

    trace!(
        "Compiled {} ({} helpers) into {:?}",
        func_name,
        helpers.len(),
        transforms
    );
    Ok(TransformProgram::new(transforms))
}

/// Stage 1: the name of the function invoked right after the `"signature"`
/// literal, e.g. `FK` in `c.set("signature",FK(e.s))`.
pub fn extract_function_name(script: &str) -> Result<String, ExtractionError> {
    FUNC_NAME_RE
        .captures(script)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or(ExtractionError::FuncNameNotFound)
}

/// Stage 2: the helper calls between the `a=a.split("")` prologue and the
/// trailing `return`, e.g. `["EK.Ck(a,11)", "EK.ml(a,1)"]`.
pub fn extract_procedure(func_name: &str, script: &str) -> Result<Vec<String>, ExtractionError> {
    let pattern = format!(
        r#"{}=function\(\w\)\{{[a-z=.()"]*;(.*);(?:.+)\}}"#,
        regex::escape(func_name)
    );
    let re = Regex::new(&pattern)
        .map_err(|_| ExtractionError::ProcedureNotFound(func_name.to_string()))?;

    let body = re
        .captures(script)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| ExtractionError::ProcedureNotFound(func_name.to_string()))?;

    Ok(body.split(';').map(str::to_string).collect())
}

/// Stage 3: the receiver of the first call, e.g. `EK`.
pub fn helper_object_name(
    func_name: &str,
    procedure: &[String],
) -> Result<String, ExtractionError> {
    procedure
        .first()
        .and_then(|call| call.split('.').next())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ExtractionError::ProcedureNotFound(func_name.to_string()))
}

/// Stage 4: `label -> function source` pairs of the helper object literal.
pub fn extract_helpers(
    helper_name: &str,
    script: &str,
) -> Result<HashMap<String, String>, ExtractionError> {
    let pattern = format!(r"var\s{}=\{{([\s\S]+?)\}};", regex::escape(helper_name));
    let re = Regex::new(&pattern)
        .map_err(|_| ExtractionError::ConvertersNotFound(helper_name.to_string()))?;

    let body = re
        .captures(script)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().replace('\n', " "))
        .ok_or_else(|| ExtractionError::ConvertersNotFound(helper_name.to_string()))?;

    Ok(body
        .split(", ")
        .filter_map(|pair| pair.split_once(':'))
        .map(|(label, source)| (label.trim().to_string(), source.to_string()))
        .collect())
}

/// Stage 5: recognizes a helper body by the idiom it contains.
pub fn classify(body: &str) -> Option<TransformKind> {
    if body.contains("reverse") {
        Some(TransformKind::Reverse)
    } else if body.contains("splice") {
        Some(TransformKind::Splice)
    } else if body.contains("{var ") {
        Some(TransformKind::Swap)
    } else {
        None
    }
}

/// Unrecognized helpers are left out; they only matter if the procedure
/// actually calls them.
pub fn classify_helpers(helpers: &HashMap<String, String>) -> HashMap<String, TransformKind> {
    helpers
        .iter()
        .filter_map(|(label, body)| classify(body).map(|kind| (label.clone(), kind)))
        .collect()
}

/// Stage 6: one raw call into one transform.
fn resolve_call(
    call: &str,
    kinds: &HashMap<String, TransformKind>,
) -> Result<Transform, ExtractionError> {
    let caps = OPERATION_RE
        .captures(call)
        .ok_or_else(|| ExtractionError::OperationUnresolved(call.to_string()))?;

    let kind = kinds
        .get(&caps[1])
        .copied()
        .ok_or_else(|| ExtractionError::OperationUnresolved(call.to_string()))?;

    let param = caps[2]
        .parse::<usize>()
        .map_err(|_| ExtractionError::ParamNotNumeric(call.to_string()))?;

    Ok(Transform::new(kind, param))
}
