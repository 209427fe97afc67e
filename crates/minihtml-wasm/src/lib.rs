//! WASM bindings for the MiniHTML parser.
//!
//! Exposes `tokenize()` and `parse()` to JavaScript via wasm-bindgen.
//! Values cross the boundary as plain JS objects built with
//! serde-wasm-bindgen.

use wasm_bindgen::prelude::*;

/// Scan MiniHTML source.
///
/// Returns `{ tokens: Token[], diagnostics: Diagnostic[] }`. Never throws on
/// malformed input; problems show up in `diagnostics`.
#[wasm_bindgen]
pub fn tokenize(source: &str) -> Result<JsValue, JsError> {
    let result = minihtml_lexer::tokenize(source);

    let tokens = serde_wasm_bindgen::to_value(&result.tokens)
        .map_err(|e| JsError::new(&e.to_string()))?;
    let diagnostics = serde_wasm_bindgen::to_value(&result.diagnostics)
        .map_err(|e| JsError::new(&e.to_string()))?;

    let js_obj = js_sys::Object::new();
    js_sys::Reflect::set(&js_obj, &"tokens".into(), &tokens)
        .map_err(|_| JsError::new("Failed to set tokens property"))?;
    js_sys::Reflect::set(&js_obj, &"diagnostics".into(), &diagnostics)
        .map_err(|_| JsError::new("Failed to set diagnostics property"))?;

    Ok(js_obj.into())
}

/// Parse MiniHTML source into a document tree.
///
/// Returns `{ nodes: Node[] }` where every node carries a `type` tag.
/// Throws a JS error listing the diagnostics if scanning reported any.
#[wasm_bindgen]
pub fn parse(source: &str) -> Result<JsValue, JsError> {
    let doc = minihtml_parser::parse(source).map_err(|e| JsError::new(&e.to_string()))?;
    serde_wasm_bindgen::to_value(&doc).map_err(|e| JsError::new(&e.to_string()))
}

/// Get the parser version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
