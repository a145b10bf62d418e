use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::schema::{FieldSpec, Record};

pub const TITLE_COLUMN: &str = "Title";
pub const DESCRIPTION_COLUMN: &str = "Description";
pub const AREA_COLUMN: &str = "Area";

static ISSUE_FIELDS: [FieldSpec; 3] = [
    FieldSpec { name: TITLE_COLUMN, index: 0 },
    FieldSpec { name: DESCRIPTION_COLUMN, index: 1 },
    FieldSpec { name: AREA_COLUMN, index: 2 },
];

/// A GitHub issue as read from the training and test files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubIssue {
    pub title: String,
    pub description: String,
    /// The area label; empty when the issue is only used for prediction
    pub area: String,
}

impl GitHubIssue {
    /// Creates an unlabeled issue
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            area: String::new(),
        }
    }

    pub fn with_area(mut self, area: impl Into<String>) -> Self {
        self.area = area.into();
        self
    }
}

impl Record for GitHubIssue {
    fn fields() -> &'static [FieldSpec] {
        &ISSUE_FIELDS
    }

    fn values(&self) -> Vec<&str> {
        vec![self.title.as_str(), self.description.as_str(), self.area.as_str()]
    }
}

/// The predicted area for a single issue along with the probability of every known area.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuePrediction {
    pub area: String,
    pub scores: HashMap<String, f32>,
}
