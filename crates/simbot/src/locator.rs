//! Element-matching strategies for the simulation request form.
//!
//! The form's markup is not ours and changes without notice, so the submit
//! control is found by trying an ordered list of [`Locator`]s and taking
//! the first hit.

use std::time::Duration;

use crate::browser::{BrowserPage, ElementQuery};
use crate::driver::DriverError;

/// Text on the submit control.
pub const SUBMIT_TEXT: &str = "Run Quick Sim";

/// Class-name fragment carried by the submit control.
pub const SUBMIT_CLASS_FRAGMENT: &str = "RunButton";

/// One way of finding an element.
pub trait Locator: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn query(&self) -> ElementQuery;

    /// How long to wait for a match. Zero means look once.
    fn wait(&self) -> Duration;
}

/// A `<button>` whose class attribute contains a fragment.
#[derive(Debug, Clone)]
pub struct ClassContains {
    pub fragment: String,
    pub wait: Duration,
}

impl Locator for ClassContains {
    fn name(&self) -> &'static str {
        "class"
    }

    fn query(&self) -> ElementQuery {
        ElementQuery::Css(format!("button[class*=\"{}\"]", self.fragment))
    }

    fn wait(&self) -> Duration {
        self.wait
    }
}

/// A `<button>` whose text contains a string.
#[derive(Debug, Clone)]
pub struct ButtonText {
    pub text: String,
    pub wait: Duration,
}

impl Locator for ButtonText {
    fn name(&self) -> &'static str {
        "button-text"
    }

    fn query(&self) -> ElementQuery {
        ElementQuery::XPath(format!("//button[contains(., \"{}\")]", self.text))
    }

    fn wait(&self) -> Duration {
        self.wait
    }
}

/// The parent of a `<span>` whose text contains a string.
#[derive(Debug, Clone)]
pub struct LabelParent {
    pub text: String,
    pub wait: Duration,
}

impl Locator for LabelParent {
    fn name(&self) -> &'static str {
        "label-parent"
    }

    fn query(&self) -> ElementQuery {
        ElementQuery::XPath(format!("//span[contains(., \"{}\")]/..", self.text))
    }

    fn wait(&self) -> Duration {
        self.wait
    }
}

/// The submit-control fallbacks, in the order they must be tried.
///
/// The class match is checked once; the text matches each wait up to
/// `text_wait`.
pub fn submit_locators(text_wait: Duration) -> Vec<Box<dyn Locator>> {
    vec![
        Box::new(ClassContains {
            fragment: SUBMIT_CLASS_FRAGMENT.to_string(),
            wait: Duration::ZERO,
        }),
        Box::new(ButtonText {
            text: SUBMIT_TEXT.to_string(),
            wait: text_wait,
        }),
        Box::new(LabelParent {
            text: SUBMIT_TEXT.to_string(),
            wait: text_wait,
        }),
    ]
}

/// The `<input>` inside the container of a `<label>` containing `label`.
pub fn labelled_input(label: &str) -> ElementQuery {
    ElementQuery::XPath(format!("//label[contains(., \"{label}\")]/..//input"))
}

/// Try `locators` in order, returning the first match and the name of the
/// locator that found it.
pub async fn locate_first<P: BrowserPage>(
    page: &P,
    locators: &[Box<dyn Locator>],
) -> Result<Option<(&'static str, P::Element)>, DriverError> {
    for locator in locators {
        if let Some(element) = page.wait_for(&locator.query(), locator.wait()).await? {
            return Ok(Some((locator.name(), element)));
        }
        tracing::debug!(locator = locator.name(), "Locator found no match");
    }
    Ok(None)
}
