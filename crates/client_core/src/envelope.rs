use serde_json::Value;

type Shape = fn(&Value) -> Option<&Value>;

/// Ordered set of accepted body shapes for one endpoint, each mapped to
/// the extraction of its payload array. First match wins; no match is a
/// shape failure reported with `expected`.
pub(crate) struct Envelope {
    pub expected: &'static str,
    shapes: &'static [Shape],
}

impl Envelope {
    pub fn extract<'a>(&self, body: &'a Value) -> Option<&'a Value> {
        self.shapes.iter().find_map(|shape| shape(body))
    }
}

fn bare_array(body: &Value) -> Option<&Value> {
    body.is_array().then_some(body)
}

fn enrollments_field(body: &Value) -> Option<&Value> {
    body.get("enrollments").filter(|field| field.is_array())
}

fn data_field(body: &Value) -> Option<&Value> {
    body.get("data").filter(|field| field.is_array())
}

fn events_field(body: &Value) -> Option<&Value> {
    body.get("events").filter(|field| field.is_array())
}

pub(crate) const ENROLLMENT_LIST: Envelope = Envelope {
    expected: "Expected enrollments array from API",
    shapes: &[bare_array, enrollments_field, data_field],
};

pub(crate) const TIMELINE: Envelope = Envelope {
    expected: "Expected events array from API",
    shapes: &[events_field],
};

#[cfg(test)]
#[path = "tests/envelope_tests.rs"]
mod tests;
