// Copyright 2020-2022 Amazon Web Services, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
//
// CloudFormation intrinsic function tag mappings from AWS CloudFormation Guard

//! Short-form YAML tags (`!Ref`, `!Sub`, ...) and their long-form keys.

use lazy_static::lazy_static;
use std::collections::HashMap;

lazy_static! {
    pub(crate) static ref SHORT_FORM_TO_LONG_MAPPING: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("Ref", "Ref");
        m.insert("Condition", "Condition");
        m.insert("GetAtt", "Fn::GetAtt");
        m.insert("Base64", "Fn::Base64");
        m.insert("Sub", "Fn::Sub");
        m.insert("GetAZs", "Fn::GetAZs");
        m.insert("ImportValue", "Fn::ImportValue");
        m.insert("Select", "Fn::Select");
        m.insert("Split", "Fn::Split");
        m.insert("Join", "Fn::Join");
        m.insert("FindInMap", "Fn::FindInMap");
        m.insert("Cidr", "Fn::Cidr");
        m.insert("Length", "Fn::Length");
        m.insert("ToJsonString", "Fn::ToJsonString");
        m.insert("And", "Fn::And");
        m.insert("Equals", "Fn::Equals");
        m.insert("If", "Fn::If");
        m.insert("Not", "Fn::Not");
        m.insert("Or", "Fn::Or");
        m
    };
}

/// Long-form key for a short-form tag name (without the leading `!`).
pub(crate) fn short_form_to_long(fn_ref: &str) -> Option<&'static str> {
    SHORT_FORM_TO_LONG_MAPPING.get(fn_ref).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_tags() {
        assert_eq!(short_form_to_long("Ref"), Some("Ref"));
        assert_eq!(short_form_to_long("Sub"), Some("Fn::Sub"));
        assert_eq!(short_form_to_long("FindInMap"), Some("Fn::FindInMap"));
    }

    #[test]
    fn test_unknown_tag() {
        assert_eq!(short_form_to_long("RefAll"), None);
    }
}
