//! Query encoding for Moodle remote function calls.
//!
//! A `RemoteCall` names a web-service function and carries its flat string
//! parameters. Array parameters expand to indexed keys (`courseids[0]`,
//! `courseids[1]`, ...) in sequence order, which is how Moodle's REST server
//! reconstructs PHP arrays from a query string.

use std::borrow::Cow;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Bytes left unescaped in keys and values: the `application/x-www-form-urlencoded`
/// unreserved set. Everything else, brackets included, is percent-encoded.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'*').remove(b'-').remove(b'.').remove(b'_');

/// Key under which the function name travels.
pub const WSFUNCTION: &str = "wsfunction";

/// A named remote function plus its parameters.
///
/// Scalar keys are unique: setting a key twice replaces the first value but
/// keeps its original position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCall {
    function: String,
    params: Vec<(String, String)>,
    array_params: Vec<(String, Vec<String>)>,
}

impl RemoteCall {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            params: Vec::new(),
            array_params: Vec::new(),
        }
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        let key = key.into();
        let value = value.to_string();
        if key == WSFUNCTION {
            self.function = value;
            return self;
        }
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.params.push((key, value)),
        }
        self
    }

    /// Boolean parameter sent as the bit string `"0"` or `"1"`.
    pub fn flag(self, key: impl Into<String>, value: bool) -> Self {
        self.param(key, bit_str(value))
    }

    pub fn array<I, S>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        let key = key.into();
        let values: Vec<String> = values.into_iter().map(|v| v.to_string()).collect();
        match self.array_params.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = values,
            None => self.array_params.push((key, values)),
        }
        self
    }

    /// Flattened key/value pairs: `wsfunction` first, then scalar parameters
    /// in insertion order, then every array parameter expanded by index.
    ///
    /// An expanded array key shadows a scalar set under the same literal key,
    /// so every key appears once.
    pub fn pairs(&self) -> Vec<(String, String)> {
        let expanded: Vec<(String, String)> = self
            .array_params
            .iter()
            .flat_map(|(key, values)| {
                values
                    .iter()
                    .enumerate()
                    .map(move |(i, value)| (format!("{key}[{i}]"), value.clone()))
            })
            .collect();
        let mut pairs = Vec::with_capacity(1 + self.params.len() + expanded.len());
        pairs.push((WSFUNCTION.to_string(), self.function.clone()));
        pairs.extend(
            self.params
                .iter()
                .filter(|(k, _)| !expanded.iter().any(|(e, _)| e == k))
                .cloned(),
        );
        pairs.extend(expanded);
        pairs
    }
}

pub fn bit_str(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

/// Append `pairs` to `base` as a percent-encoded query string.
///
/// `base` is only borrowed. If it already has a query component the new pairs
/// are joined with `&`.
pub fn encode_url(base: &str, pairs: &[(String, String)]) -> String {
    let mut url = String::from(base);
    if pairs.is_empty() {
        return url;
    }
    if !url.contains('?') {
        url.push('?');
    } else if !url.ends_with('?') && !url.ends_with('&') {
        url.push('&');
    }
    let encoded: Vec<String> = pairs
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                utf8_percent_encode(k, QUERY_COMPONENT),
                utf8_percent_encode(v, QUERY_COMPONENT)
            )
        })
        .collect();
    url.push_str(&encoded.join("&"));
    url
}

/// Split the query string of `url` back into decoded pairs, in order.
pub fn decode_query(url: &str) -> Vec<(String, String)> {
    let query = match url.split_once('?') {
        Some((_, q)) => q,
        None => url,
    };
    let query = query.split('#').next().unwrap_or_default();
    query
        .split('&')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (k, v) = part.split_once('=').unwrap_or((part, ""));
            (decode_component(k), decode_component(v))
        })
        .collect()
}

fn decode_component(raw: &str) -> String {
    let spaced: Cow<'_, str> = if raw.contains('+') {
        Cow::Owned(raw.replace('+', " "))
    } else {
        Cow::Borrowed(raw)
    };
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://lms.example.edu/webservice/rest/server.php";

    fn owned(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn wsfunction_comes_first() {
        let call = RemoteCall::new("core_enrol_get_enrolled_users").param("courseid", 7);
        assert_eq!(
            call.pairs(),
            owned(&[("wsfunction", "core_enrol_get_enrolled_users"), ("courseid", "7")])
        );
    }

    #[test]
    fn array_params_expand_in_order() {
        let call = RemoteCall::new("mod_quiz_get_quizzes_by_courses").array("courseids", [3, 1, 2]);
        assert_eq!(
            call.pairs(),
            owned(&[
                ("wsfunction", "mod_quiz_get_quizzes_by_courses"),
                ("courseids[0]", "3"),
                ("courseids[1]", "1"),
                ("courseids[2]", "2"),
            ])
        );
    }

    #[test]
    fn repeated_key_replaces_in_place() {
        let call = RemoteCall::new("f").param("a", "1").param("b", "2").param("a", "3");
        assert_eq!(call.pairs(), owned(&[("wsfunction", "f"), ("a", "3"), ("b", "2")]));
    }

    #[test]
    fn array_expansion_shadows_matching_scalar() {
        let call = RemoteCall::new("f")
            .param("courseids[0]", "9")
            .param("other", "x")
            .array("courseids", ["1"]);
        assert_eq!(
            call.pairs(),
            owned(&[("wsfunction", "f"), ("other", "x"), ("courseids[0]", "1")])
        );
    }

    #[test]
    fn wsfunction_param_renames_the_call() {
        let call = RemoteCall::new("old").param("wsfunction", "new");
        assert_eq!(call.function(), "new");
        assert_eq!(call.pairs().len(), 1);
    }

    #[test]
    fn flags_are_bit_strings() {
        let call = RemoteCall::new("mod_quiz_process_attempt")
            .flag("finishattempt", true)
            .flag("timeup", false);
        assert_eq!(
            call.pairs()[1..],
            owned(&[("finishattempt", "1"), ("timeup", "0")])[..]
        );
    }

    #[test]
    fn encode_brackets_and_reserved_characters() {
        let url = encode_url(BASE, &owned(&[("courseids[0]", "5"), ("q", "a b&c=d/é")]));
        assert_eq!(url, format!("{BASE}?courseids%5B0%5D=5&q=a%20b%26c%3Dd%2F%C3%A9"));
    }

    #[test]
    fn encode_appends_to_existing_query() {
        let base = format!("{BASE}?wstoken=abc");
        let url = encode_url(&base, &owned(&[("x", "1")]));
        assert_eq!(url, format!("{BASE}?wstoken=abc&x=1"));
        assert_eq!(base, format!("{BASE}?wstoken=abc"));
    }

    #[test]
    fn encode_without_pairs_returns_base() {
        assert_eq!(encode_url(BASE, &[]), BASE);
    }

    #[test]
    fn round_trip_recovers_pairs_in_order() {
        let call = RemoteCall::new("mod_quiz_get_quizzes_by_courses")
            .param("note", "50% + tax?")
            .param("empty", "")
            .array("courseids", ["10", "2", "33"])
            .array("names", ["x y", "ü"]);
        let pairs = call.pairs();
        let url = encode_url(BASE, &pairs);
        assert_eq!(decode_query(&url), pairs);
    }

    #[test]
    fn decode_treats_plus_as_space() {
        assert_eq!(decode_query("?a=b+c"), owned(&[("a", "b c")]));
    }
}
