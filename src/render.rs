//! Placeholder substitution for log templates.
//!
//! Templates use `{}` as positional placeholder and `\{}` for a literal
//! `{}`. A doubled backslash `\\{}` is a literal backslash followed by a
//! placeholder. Rendering never fails: missing arguments leave their
//! placeholder in the output, surplus arguments are dropped, and a single trailing error
//! argument becomes the record's [`CauseChain`] instead of being inlined.

use std::{error::Error as StdError, fmt, sync::Arc};

use serde::Serialize;

const PLACEHOLDER: &str = "{}";

/// A message argument.
#[derive(Clone)]
pub enum Arg {
    /// Substituted by its textual form.
    Text(String),
    /// An error value; inlined by its `Display` form unless it is the
    /// trailing cause.
    Error(Arc<dyn StdError + Send + Sync + 'static>),
}

impl Arg {
    pub fn display<T>(value: T) -> Self
    where
        T: fmt::Display,
    {
        Self::Text(value.to_string())
    }

    pub fn debug<T>(value: T) -> Self
    where
        T: fmt::Debug,
    {
        Self::Text(format!("{value:?}"))
    }

    pub fn error<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Error(Arc::new(err))
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// The textual form used when the argument is inlined.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Error(err) => err.to_string(),
        }
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Error(err) => f.debug_tuple("Error").field(&err.to_string()).finish(),
        }
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for Arg {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<Box<dyn StdError + Send + Sync + 'static>> for Arg {
    fn from(err: Box<dyn StdError + Send + Sync + 'static>) -> Self {
        Self::Error(Arc::from(err))
    }
}

macro_rules! impl_from_display {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Arg {
                fn from(value: $ty) -> Self {
                    Self::Text(value.to_string())
                }
            }
        )*
    };
}

impl_from_display!(
    bool, char, f32, f64, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize
);

/// An error and its `source()` chain, outermost first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CauseChain {
    messages: Vec<String>,
}

impl CauseChain {
    pub fn from_error(err: &(dyn StdError + 'static)) -> Self {
        let mut messages = vec![err.to_string()];
        let mut source = err.source();
        while let Some(cause) = source {
            messages.push(cause.to_string());
            source = cause.source();
        }
        Self { messages }
    }

    /// The outermost error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.messages[0]
    }

    /// Every message in the chain, outermost first.
    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

impl fmt::Display for CauseChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())?;
        for cause in &self.messages[1..] {
            write!(f, "\n  caused by: {cause}")?;
        }
        Ok(())
    }
}

/// Output of [`render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub message: String,
    pub cause: Option<CauseChain>,
}

/// Splits the escape off the text preceding a `{}`.
///
/// Returns the text to emit and whether the `{}` is a placeholder.
fn unescape(head: &str) -> (&str, bool) {
    if head.ends_with(r"\\") {
        (&head[..head.len() - 1], true)
    } else if let Some(head) = head.strip_suffix('\\') {
        (head, false)
    } else {
        (head, true)
    }
}

/// Counts the unescaped placeholders in `template`.
#[must_use]
pub fn placeholder_count(template: &str) -> usize {
    let mut count = 0;
    let mut rest = template;
    while let Some(index) = rest.find(PLACEHOLDER) {
        if unescape(&rest[..index]).1 {
            count += 1;
        }
        rest = &rest[index + PLACEHOLDER.len()..];
    }
    count
}

/// Substitutes `args` into the placeholders of `template`.
///
/// # Examples
///
/// ```
/// use scoped_logger::render::{Arg, render};
///
/// let rendered = render("User {} logged in", &[Arg::from("alice")]);
/// assert_eq!(rendered.message, "User alice logged in");
/// assert!(rendered.cause.is_none());
/// ```
#[must_use]
pub fn render(template: &str, args: &[Arg]) -> Rendered {
    let placeholders = placeholder_count(template);

    let (inline, cause) = match args.split_last() {
        Some((Arg::Error(err), rest)) if args.len() == placeholders + 1 => {
            (rest, Some(CauseChain::from_error(&**err)))
        }
        _ => (args, None),
    };

    let mut message = String::with_capacity(template.len() + inline.len() * 8);
    let mut args = inline.iter();
    let mut rest = template;
    while let Some(index) = rest.find(PLACEHOLDER) {
        let (head, tail) = rest.split_at(index);
        let (head, is_placeholder) = unescape(head);
        message.push_str(head);
        let arg = if is_placeholder { args.next() } else { None };
        match arg {
            Some(arg) => message.push_str(&arg.to_text()),
            None => message.push_str(PLACEHOLDER),
        }
        rest = &tail[PLACEHOLDER.len()..];
    }
    message.push_str(rest);

    Rendered { message, cause }
}
