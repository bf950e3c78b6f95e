//! A deliberately tiny statement interpreter for the handful of
//! CommonJS-shaped statement forms `loader-cli`'s demo modules use.
//!
//! A real JavaScript engine is explicitly out of scope for this whole
//! crate family (spec §1: "the evaluation sandbox... is explicitly out
//! of scope"); this is just enough of one — `const x = require(...)`,
//! `exports.k = <literal>`, a couple of arrow-function shapes, and a
//! `module.exports = { ... }` object literal — to let the CLI and the
//! demo binaries actually exercise the Loader end to end without
//! linking a real engine.

use std::collections::HashMap;

use loader_core::{JsFunction, JsObject, JsValue, ModuleArgs};
use regex::Regex;

/// Compiles a static regex pattern at each call site.
///
/// A hand-rolled stand-in for a `once_cell`-memoized static: every
/// pattern here is used once per module evaluation, on a path that is
/// already doing far more allocation elsewhere in this toy interpreter,
/// so the recompilation cost never shows up in practice.
macro_rules! regex {
    ($pattern:expr) => {
        Regex::new($pattern).expect("interpreter pattern is a compile-time constant")
    };
}

/// Runs every statement in `source` against `args`, mutating
/// `args.exports` (and `args.module`) in place.
///
/// # Errors
/// Propagates a `require` failure from any statement that calls it.
pub fn interpret(source: &str, args: &ModuleArgs) -> loader_core::JsResult<()> {
    let const_require = regex!(r#"^const\s+(\w+)\s*=\s*require\(\s*["']([^"']+)["']\s*\)(?:\.(\w+))?$"#);
    let exports_require = regex!(r#"^exports\.(\w+)\s*=\s*require\(\s*["']([^"']+)["']\s*\)(?:\.(\w+))?$"#);
    let exports_arrow = regex!(
        r#"^exports\.(\w+)\s*=\s*\(\)\s*=>\s*(\w+)\.(\w+)(\(\))?(?:\s*\?\s*["'](.*?)["']\s*:\s*["'](.*?)["'])?$"#
    );
    let module_exports_object = regex!(r"^module\.exports\s*=\s*\{(.*)\}$");
    let exports_literal = regex!(r"^exports\.(\w+)\s*=\s*(.+)$");

    let mut bindings: HashMap<String, JsValue> = HashMap::new();

    for statement in split_statements(source) {
        if let Some(caps) = const_require.captures(statement) {
            let value = args.require.call(&caps[2])?;
            let value = project(&value, caps.get(3).map(|m| m.as_str()));
            bindings.insert(caps[1].to_owned(), value);
        } else if let Some(caps) = exports_require.captures(statement) {
            let value = args.require.call(&caps[2])?;
            let value = project(&value, caps.get(3).map(|m| m.as_str()));
            args.exports.set(caps[1].to_owned(), value);
        } else if let Some(caps) = exports_arrow.captures(statement) {
            let key = caps[1].to_owned();
            let receiver = bindings.get(&caps[2]).cloned().unwrap_or(JsValue::Undefined);
            let prop = caps[3].to_owned();
            let calls = caps.get(4).is_some();
            let ternary = caps
                .get(5)
                .zip(caps.get(6))
                .map(|(a, b)| (a.as_str().to_owned(), b.as_str().to_owned()));
            args.exports.set(key, arrow_function(receiver, prop, calls, ternary));
        } else if let Some(caps) = module_exports_object.captures(statement) {
            for (key, value) in parse_object_literal(&caps[1]) {
                args.exports.set(key, value);
            }
        } else if let Some(caps) = exports_literal.captures(statement) {
            args.exports.set(caps[1].to_owned(), parse_literal(&caps[2]));
        } else if !statement.is_empty() {
            log::warn!("demo interpreter skipped an unrecognized statement: {statement}");
        }
    }

    Ok(())
}

fn project(value: &JsValue, prop: Option<&str>) -> JsValue {
    match prop {
        Some(prop) => value.as_object().map_or(JsValue::Undefined, |o| o.get(prop)),
        None => value.clone(),
    }
}

/// Builds the closure backing `() => ident.prop`, `() => ident.prop()`,
/// and `() => ident.prop ? "a" : "b"` — the three arrow-function shapes
/// the cyclic-module demo needs.
fn arrow_function(
    receiver: JsValue,
    prop: String,
    calls: bool,
    ternary: Option<(String, String)>,
) -> JsValue {
    JsValue::Function(JsFunction::new(move |_args| {
        let property = receiver.as_object().map_or(JsValue::Undefined, |o| o.get(&prop));
        if let Some((if_truthy, if_falsy)) = &ternary {
            let truthy = !matches!(property, JsValue::Undefined | JsValue::Null);
            return Ok(JsValue::string(if truthy { if_truthy.clone() } else { if_falsy.clone() }));
        }
        if calls {
            return property
                .as_function()
                .map_or(Ok(JsValue::Undefined), |f| f.call(&[]));
        }
        Ok(property)
    }))
}

fn parse_object_literal(body: &str) -> Vec<(String, JsValue)> {
    let entry = regex!(r#"(\w+)\s*:\s*([^,]+)"#);
    entry
        .captures_iter(body)
        .map(|c| (c[1].to_owned(), parse_literal(c[2].trim())))
        .collect()
}

fn parse_literal(raw: &str) -> JsValue {
    let raw = raw.trim().trim_end_matches(';').trim();
    if raw.len() >= 2 {
        let bytes = raw.as_bytes();
        let quoted = (bytes[0] == b'"' && bytes[raw.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[raw.len() - 1] == b'\'');
        if quoted {
            return JsValue::string(raw[1..raw.len() - 1].to_owned());
        }
    }
    match raw {
        "true" => JsValue::Boolean(true),
        "false" => JsValue::Boolean(false),
        "null" => JsValue::Null,
        "undefined" | "" => JsValue::Undefined,
        _ => raw.parse::<f64>().map_or_else(
            |_| {
                log::trace!("demo interpreter treated unrecognized literal '{raw}' as undefined");
                JsValue::Undefined
            },
            JsValue::Number,
        ),
    }
}

fn split_statements(source: &str) -> impl Iterator<Item = &str> {
    source.split(';').map(str::trim).filter(|s| !s.is_empty())
}

/// Parses a bare JSON-like literal the same way `exports.k = <literal>`
/// statements are parsed, backing `Environment::parse_json` for the
/// `.json`-file special case in spec §4.4.
///
/// # Errors
/// Never actually fails; kept fallible to match the trait it backs.
pub fn parse_json(source: &str) -> loader_core::JsResult<JsValue> {
    let source = source.trim();
    if let Some(body) = source.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
        let object = JsObject::new();
        for (key, value) in parse_object_literal(body) {
            object.set(key, value);
        }
        return Ok(JsValue::Object(object));
    }
    Ok(parse_literal(source))
}
