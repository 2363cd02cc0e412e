// RDT - Routine DevTools Bridge
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Proxy configuration.

use rdt_common::LoadConfig;

/// Tunables of the proxy core. The defaults are the values the front-end
/// integration was validated against; embedders rarely need to change them.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Frames fetched per routine on every pause
    pub max_stack_depth: i64,
    /// Load configuration for pause-time stack fetches. Kept minimal: deep
    /// inspection goes through the evaluator on demand instead of being paid
    /// on every pause.
    pub frame_load: LoadConfig,
    /// Load configuration for expression evaluation
    pub eval_load: LoadConfig,
    /// Synthetic source entry the backend reports but no filesystem path
    /// backs; filtered from the file list.
    pub synthetic_source_marker: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            max_stack_depth: 50,
            frame_load: LoadConfig {
                follow_pointers: true,
                max_variable_recurse: 1,
                max_string_len: 1,
                max_array_values: 1,
                max_struct_fields: 1,
            },
            eval_load: LoadConfig {
                follow_pointers: true,
                max_variable_recurse: 1,
                max_string_len: 500,
                max_array_values: 1,
                max_struct_fields: 1,
            },
            synthetic_source_marker: "<autogenerated>".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_load_configs_differ_only_in_string_length() {
        let config = ProxyConfig::default();
        assert_eq!(config.max_stack_depth, 50);
        assert_eq!(config.frame_load.max_string_len, 1);
        assert_eq!(config.eval_load.max_string_len, 500);

        let mut frame = config.frame_load;
        frame.max_string_len = config.eval_load.max_string_len;
        assert_eq!(frame, config.eval_load);
    }
}
