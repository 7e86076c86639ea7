// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request types for the API.

use serde::Deserialize;

/// Query string of `GET /api/files`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilesQuery {
    /// Model to fetch; the whole catalog is listed when absent.
    #[serde(default, rename = "fileName")]
    pub file_name: Option<String>,
}

impl FilesQuery {
    /// Requested model name, treating an empty value as absent.
    pub fn model(&self) -> Option<&str> {
        self.file_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}
