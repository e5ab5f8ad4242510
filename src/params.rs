//! Positional command parameters.

use serde_json::Value;

use crate::SoundId;

/// Ordered, untyped parameters passed by the host with a command.
///
/// Accessors never fail: a missing or wrong-typed value reads as `None` or
/// as the supplied default.
///
/// # Example
///
/// ```
/// use ui_sounds::Params;
///
/// let params = Params::from_json(r#"["click.mp3", 0.25]"#).unwrap();
/// assert_eq!(params.string(0), Some("click.mp3"));
/// assert_eq!(params.number_or(1, 1.0), 0.25);
/// assert_eq!(params.number_or(2, 1.0), 1.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(Vec<Value>);

impl Params {
    /// Wraps a list of values.
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    /// Parses a JSON array.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is not a JSON array.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json).map(Self)
    }

    /// Returns the number of parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the raw value at `index`.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Returns the string at `index`, or `None` if absent or not a string.
    pub fn string(&self, index: usize) -> Option<&str> {
        self.0.get(index).and_then(Value::as_str)
    }

    /// Returns the string at `index` as a [`SoundId`].
    pub fn sound_id(&self, index: usize) -> Option<SoundId> {
        self.string(index).map(SoundId::from)
    }

    /// Returns every parameter as a sound id, `None` where it is not a string.
    pub fn sound_ids(&self) -> Vec<Option<SoundId>> {
        (0..self.len()).map(|i| self.sound_id(i)).collect()
    }

    /// Returns the number at `index`, or `default` if absent or not numeric.
    ///
    /// Strings holding a number (`"0.5"`) are accepted.
    pub fn number_or(&self, index: usize, default: f64) -> f64 {
        match self.0.get(index) {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(default),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
            _ => default,
        }
    }
}

impl From<Vec<Value>> for Params {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl FromIterator<Value> for Params {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_accessor() {
        let params = Params::new(vec![json!("a.mp3"), json!(3), Value::Null]);
        assert_eq!(params.string(0), Some("a.mp3"));
        assert_eq!(params.string(1), None);
        assert_eq!(params.string(2), None);
        assert_eq!(params.string(9), None);
    }

    #[test]
    fn test_number_default() {
        let params = Params::new(vec![json!("a.mp3")]);
        assert!((params.number_or(1, 1.0) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_number_wrong_type_uses_default() {
        let params = Params::new(vec![json!("a.mp3"), json!("loud"), json!(true), Value::Null]);
        assert!((params.number_or(1, 0.7) - 0.7).abs() < f64::EPSILON);
        assert!((params.number_or(2, 0.7) - 0.7).abs() < f64::EPSILON);
        assert!((params.number_or(3, 0.7) - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn test_number_from_numeric_string() {
        let params = Params::new(vec![json!(" 0.5 ")]);
        assert!((params.number_or(0, 1.0) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_sound_ids_keep_positions() {
        let params: Params = vec![json!("a"), json!(null), json!("b")].into();
        assert_eq!(
            params.sound_ids(),
            vec![Some(SoundId::new("a")), None, Some(SoundId::new("b"))]
        );
    }

    #[test]
    fn test_from_json() {
        let params = Params::from_json(r#"["a.mp3", 0.5]"#).unwrap();
        assert_eq!(params.len(), 2);
        assert!(Params::from_json(r#"{"id": "a.mp3"}"#).is_err());
        assert!(Params::from_json("[]").unwrap().is_empty());
    }
}
