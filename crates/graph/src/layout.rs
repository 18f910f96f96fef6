//! Layout geometry and its XML fragment form.
//!
//! The fragment is what gets embedded in CGIF comments so that node
//! positions survive a text round trip:
//!
//! ```text
//! <layout>
//!     <rectangle x="10" y="20" width="60" height="30"/>
//! </layout>
//! ```

use crate::error::{GraphError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Smallest width a node can be drawn with
pub const MIN_WIDTH: f64 = 12.0;

/// Smallest height a node can be drawn with
pub const MIN_HEIGHT: f64 = 8.0;

static RECTANGLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<rectangle\b([^>]*?)/?>").expect("valid rectangle regex"));

static ATTRIBUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([A-Za-z_][A-Za-z0-9_]*)\s*=\s*"([^"]*)""#).expect("valid attribute regex"));

/// Position and size of a node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 60.0,
            height: 30.0,
        }
    }
}

impl Layout {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Multi-line XML fragment, indented with `indent`
    pub fn to_xml(&self, indent: &str) -> String {
        format!(
            "{indent}<layout>\n{indent}    <rectangle x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"/>\n{indent}</layout>\n",
            self.x, self.y, self.width, self.height
        )
    }

    /// Parse the fragment produced by [`Layout::to_xml`].
    ///
    /// Whitespace between tags is irrelevant; the first `rectangle`
    /// element must carry all four numeric attributes.
    pub fn parse_xml(fragment: &str) -> Result<Self> {
        let caps = RECTANGLE
            .captures(fragment)
            .ok_or_else(|| GraphError::layout(format!("no rectangle element in \"{}\"", fragment.trim())))?;
        let attrs: HashMap<&str, &str> = ATTRIBUTE
            .captures_iter(caps.get(1).map_or("", |m| m.as_str()))
            .filter_map(|c| Some((c.get(1)?.as_str(), c.get(2)?.as_str())))
            .collect();

        let number = |name: &str| -> Result<f64> {
            let raw = attrs
                .get(name)
                .ok_or_else(|| GraphError::layout(format!("rectangle is missing \"{}\"", name)))?;
            raw.trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| GraphError::layout(format!("{}=\"{}\" is not a number", name, raw)))
        };

        Ok(Self {
            x: number("x")?,
            y: number("y")?,
            width: number("width")?,
            height: number("height")?,
        })
    }

    /// Grow the box to the minimum drawable size; returns true if resized
    pub fn resize_if_necessary(&mut self) -> bool {
        let mut resized = false;
        if self.width < MIN_WIDTH {
            self.width = MIN_WIDTH;
            resized = true;
        }
        if self.height < MIN_HEIGHT {
            self.height = MIN_HEIGHT;
            resized = true;
        }
        resized
    }
}
