//! Tokenizer for pipeline strings.
//!
//! A pipeline string is a whitespace separated list of `+key=value`,
//! `+key` flags and the step markers `+proj=pipeline` / `+step`. Values
//! may be double quoted to contain whitespace. The leading `+` is optional.

use std::fmt;

use crate::error::{Error, Result};

/// One `+key` or `+key=value` parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub key: String,
    pub value: Option<String>,
}

impl Param {
    pub fn flag(key: &str) -> Self {
        Self {
            key: key.to_string(),
            value: None,
        }
    }

    pub fn with_value(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: Some(value.to_string()),
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            None => write!(f, "+{}", self.key),
            Some(value) if value.is_empty() || value.contains(char::is_whitespace) => {
                write!(f, "+{}=\"{}\"", self.key, value)
            }
            Some(value) => write!(f, "+{}={}", self.key, value),
        }
    }
}

/// One step: a PROJ operation name, its direction and its parameters.
/// The name is empty for steps that only carry parameters, such as
/// `+init=` references.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Step {
    pub name: String,
    pub inverted: bool,
    pub params: Vec<Param>,
}

impl Step {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Value of the first `key` parameter. Flags have no value.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.key == key)
            .and_then(|p| p.value.as_deref())
    }

    pub fn has(&self, key: &str) -> bool {
        self.params.iter().any(|p| p.key == key)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::with_capacity(self.params.len() + 2);
        if self.inverted {
            parts.push("+inv".to_string());
        }
        if !self.name.is_empty() {
            parts.push(format!("+proj={}", self.name));
        }
        parts.extend(self.params.iter().map(Param::to_string));
        f.write_str(&parts.join(" "))
    }
}

/// A tokenized pipeline string.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProjTokens {
    /// True for `+proj=pipeline` strings
    pub pipeline: bool,
    /// Parameters written before the first `+step`, which apply to every step
    pub global_params: Vec<Param>,
    pub steps: Vec<Step>,
}

impl fmt::Display for ProjTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.pipeline {
            return match self.steps.first() {
                Some(step) => write!(f, "{}", step),
                None => Ok(()),
            };
        }
        f.write_str("+proj=pipeline")?;
        for param in &self.global_params {
            write!(f, " {}", param)?;
        }
        for step in &self.steps {
            write!(f, " +step {}", step)?;
        }
        Ok(())
    }
}

fn split_words(text: &str) -> Result<Vec<(usize, String)>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut start: Option<usize> = None;
    let mut in_quotes = false;
    for (i, c) in text.char_indices() {
        if c == '"' {
            in_quotes = !in_quotes;
            start.get_or_insert(i);
            continue;
        }
        if c.is_whitespace() && !in_quotes {
            if let Some(s) = start.take() {
                words.push((s, std::mem::take(&mut current)));
            }
            continue;
        }
        start.get_or_insert(i);
        current.push(c);
    }
    if in_quotes {
        return Err(Error::parse_at(
            "Unterminated quoted value",
            start.unwrap_or_default(),
        ));
    }
    if let Some(s) = start {
        words.push((s, current));
    }
    Ok(words)
}

/// Split `text` into steps and parameters.
pub fn tokenize(text: &str) -> Result<ProjTokens> {
    let words = split_words(text)?;
    if words.is_empty() {
        return Err(Error::parse("Empty pipeline string"));
    }

    let mut tokens = ProjTokens::default();
    let mut current: Option<Step> = None;
    for (offset, word) in words {
        let word = word.strip_prefix('+').unwrap_or(&word);
        let (key, value) = match word.split_once('=') {
            Some((key, value)) => (key, Some(value)),
            None => (word, None),
        };
        if key.is_empty() {
            return Err(Error::parse_at("Parameter without a name", offset));
        }
        match (key, value) {
            ("proj", Some("pipeline")) => {
                if tokens.pipeline || current.is_some() {
                    return Err(Error::parse_at("Nested pipelines are not supported", offset));
                }
                tokens.pipeline = true;
            }
            ("step", None) => {
                if !tokens.pipeline {
                    return Err(Error::parse_at("+step outside of a pipeline", offset));
                }
                if let Some(step) = current.take() {
                    tokens.steps.push(step);
                }
                current = Some(Step::default());
            }
            ("proj", Some(name)) => {
                if tokens.pipeline && current.is_none() {
                    return Err(Error::parse_at("+proj= before the first +step", offset));
                }
                let step = current.get_or_insert_with(Step::default);
                if !step.name.is_empty() {
                    return Err(Error::parse_at(
                        format!("Step '{}' has a second +proj=", step.name),
                        offset,
                    ));
                }
                if name.is_empty() {
                    return Err(Error::parse_at("Empty +proj= value", offset));
                }
                step.name = name.to_string();
            }
            ("inv", None) => {
                if tokens.pipeline && current.is_none() {
                    return Err(Error::parse_at("+inv must follow +step", offset));
                }
                let step = current.get_or_insert_with(Step::default);
                if step.inverted {
                    log::warn!("Repeated +inv at offset {} cancels the previous one", offset);
                }
                step.inverted = !step.inverted;
            }
            (key, value) => {
                let param = Param {
                    key: key.to_string(),
                    value: value.map(str::to_string),
                };
                if tokens.pipeline && current.is_none() {
                    tokens.global_params.push(param);
                } else {
                    current.get_or_insert_with(Step::default).params.push(param);
                }
            }
        }
    }
    if let Some(step) = current.take() {
        tokens.steps.push(step);
    }

    if tokens.steps.is_empty() {
        return Err(Error::parse("Pipeline without steps"));
    }
    if let Some(step) = tokens
        .steps
        .iter()
        .find(|step| step.name.is_empty() && !step.has("init"))
    {
        return Err(Error::parse(format!("Missing +proj= in step '{}'", step)));
    }
    Ok(tokens)
}
