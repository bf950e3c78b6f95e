//! A real (if deliberately simple) [`MockSynthesizer`]: walks a real
//! module's exported object, replacing every function-shaped property
//! with a fresh no-op mock function and keeping every other property's
//! shape as-is, the way a production automocker walks property
//! descriptors without caring about a function's actual behavior.

use loader_core::{JsFunction, JsObject, JsValue, MockShape, MockSynthesizer};

/// Produces an automock by copying a real module's own property keys
/// and replacing callables with mock functions.
#[derive(Debug, Default)]
pub struct ShapeCopyingMockSynthesizer;

impl MockSynthesizer for ShapeCopyingMockSynthesizer {
    fn get_metadata(&self, value: &JsValue) -> Option<MockShape> {
        match value {
            JsValue::Object(obj) if !obj.is_empty() => Some(MockShape(value.clone())),
            JsValue::Function(_) => Some(MockShape(value.clone())),
            _ => None,
        }
    }

    fn generate_from_metadata(&self, shape: &MockShape) -> JsValue {
        copy_shape(&shape.0)
    }

    fn get_mock_function(&self) -> JsValue {
        JsValue::Function(mock_function())
    }
}

fn copy_shape(value: &JsValue) -> JsValue {
    match value {
        JsValue::Object(obj) => {
            let mocked = JsObject::new();
            for key in obj.keys() {
                mocked.set(key.clone(), copy_shape(&obj.get(&key)));
            }
            JsValue::Object(mocked)
        }
        JsValue::Function(_) => JsValue::Function(mock_function()),
        other => other.clone(),
    }
}

fn mock_function() -> JsFunction {
    JsFunction::new(|_args| Ok(JsValue::Undefined))
}
