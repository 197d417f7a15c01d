//! ARM resource identifier parsing
//!
//! An ARM ID is a `/`-separated path of alternating literal and
//! user-supplied segments, e.g.
//! `/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}/...`.
//! Typed IDs describe their layout as a list of [`Segment`]s and get strict
//! and case-insensitive parsing from [`ResourceIdType`].

use std::collections::HashMap;

/// One component of an ARM resource ID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub name: &'static str,
    pub kind: SegmentKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// A literal such as `resourceGroups` or `Microsoft.Relay`
    Static(&'static str),
    /// A value supplied by the user, e.g. a namespace name
    UserSpecified,
}

impl Segment {
    pub const fn fixed(name: &'static str, value: &'static str) -> Self {
        Self {
            name,
            kind: SegmentKind::Static(value),
        }
    }

    pub const fn user(name: &'static str) -> Self {
        Self {
            name,
            kind: SegmentKind::UserSpecified,
        }
    }
}

/// Leading segments shared by every resource-group scoped ID
pub const fn resource_group_scope() -> [Segment; 4] {
    [
        Segment::fixed("staticSubscriptions", "subscriptions"),
        Segment::user("subscriptionId"),
        Segment::fixed("staticResourceGroups", "resourceGroups"),
        Segment::user("resourceGroupName"),
    ]
}

/// Error parsing a resource ID
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("parsing {description} ID: the ID was empty")]
    Empty { description: &'static str },

    #[error(
        "parsing {description} ID {input:?}: the segment '{segment}' was not found, expected the ID to be in the format {format:?}"
    )]
    MissingSegment {
        description: &'static str,
        input: String,
        segment: &'static str,
        format: String,
    },

    #[error(
        "parsing {description} ID {input:?}: expected the segment '{segment}' to be {expected:?} but got {got:?}"
    )]
    UnexpectedSegment {
        description: &'static str,
        input: String,
        segment: &'static str,
        expected: &'static str,
        got: String,
    },

    #[error("parsing {description} ID {input:?}: the segment '{segment}' was empty")]
    EmptySegment {
        description: &'static str,
        input: String,
        segment: &'static str,
    },

    #[error(
        "parsing {description} ID {input:?}: unexpected trailing segments, expected the ID to be in the format {format:?}"
    )]
    TrailingSegments {
        description: &'static str,
        input: String,
        format: String,
    },
}

/// Values of the user-specified segments of a parsed ID
#[derive(Debug, Clone, Default)]
pub struct ParsedId {
    values: HashMap<&'static str, String>,
}

impl ParsedId {
    /// Value of a user-specified segment
    ///
    /// Only called with names taken from the same segment list used to
    /// parse, so a missing value yields an empty string.
    pub fn value(&self, name: &str) -> String {
        self.values.get(name).cloned().unwrap_or_default()
    }
}

/// Human readable layout, e.g. `/subscriptions/{subscriptionId}/...`
pub fn format_of(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|s| match s.kind {
            SegmentKind::Static(value) => format!("/{}", value),
            SegmentKind::UserSpecified => format!("/{{{}}}", s.name),
        })
        .collect()
}

/// Split `input` against `segments`
///
/// Literal segments are matched exactly, or ignoring ASCII case when
/// `insensitive` is set. User-specified values are kept as written. The
/// leading `/` is optional.
pub fn parse_segments(
    description: &'static str,
    input: &str,
    segments: &[Segment],
    insensitive: bool,
) -> Result<ParsedId, ParseError> {
    let trimmed = input.strip_prefix('/').unwrap_or(input);
    if trimmed.is_empty() {
        return Err(ParseError::Empty { description });
    }

    let parts: Vec<&str> = trimmed.split('/').collect();
    let mut parsed = ParsedId::default();

    for (position, segment) in segments.iter().enumerate() {
        let Some(part) = parts.get(position) else {
            return Err(ParseError::MissingSegment {
                description,
                input: input.to_string(),
                segment: segment.name,
                format: format_of(segments),
            });
        };

        match segment.kind {
            SegmentKind::Static(expected) => {
                let matches = if insensitive {
                    part.eq_ignore_ascii_case(expected)
                } else {
                    *part == expected
                };
                if !matches {
                    return Err(ParseError::UnexpectedSegment {
                        description,
                        input: input.to_string(),
                        segment: segment.name,
                        expected,
                        got: part.to_string(),
                    });
                }
            }
            SegmentKind::UserSpecified => {
                if part.is_empty() {
                    return Err(ParseError::EmptySegment {
                        description,
                        input: input.to_string(),
                        segment: segment.name,
                    });
                }
                parsed.values.insert(segment.name, part.to_string());
            }
        }
    }

    if parts.len() > segments.len() {
        return Err(ParseError::TrailingSegments {
            description,
            input: input.to_string(),
            format: format_of(segments),
        });
    }

    Ok(parsed)
}

/// A typed ARM resource ID
pub trait ResourceIdType: Sized {
    /// Human readable name used in errors, e.g. "Relay Namespace"
    const DESCRIPTION: &'static str;

    fn segments() -> Vec<Segment>;

    fn from_parsed(parsed: &ParsedId) -> Self;

    /// Canonical string form
    fn id(&self) -> String;

    /// Description used in log and error messages
    fn describe(&self) -> String {
        format!("{} {:?}", Self::DESCRIPTION, self.id())
    }

    /// Parse an ID whose literal segments must match exactly
    fn parse(input: &str) -> Result<Self, ParseError> {
        parse_segments(Self::DESCRIPTION, input, &Self::segments(), false)
            .map(|p| Self::from_parsed(&p))
    }

    /// Parse an ID returned by the API, whose literal segments may differ
    /// in case from the canonical form
    fn parse_insensitively(input: &str) -> Result<Self, ParseError> {
        parse_segments(Self::DESCRIPTION, input, &Self::segments(), true)
            .map(|p| Self::from_parsed(&p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group_segments() -> Vec<Segment> {
        resource_group_scope().to_vec()
    }

    #[test]
    fn format_lists_placeholders() {
        assert_eq!(
            format_of(&group_segments()),
            "/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}"
        );
    }

    #[test]
    fn parses_user_values() {
        let parsed = parse_segments(
            "Resource Group",
            "/subscriptions/sub/resourceGroups/rg",
            &group_segments(),
            false,
        )
        .unwrap();
        assert_eq!(parsed.value("subscriptionId"), "sub");
        assert_eq!(parsed.value("resourceGroupName"), "rg");
    }

    #[test]
    fn missing_segment_is_named() {
        let err = parse_segments("Resource Group", "/subscriptions/sub", &group_segments(), false)
            .unwrap_err();
        match err {
            ParseError::MissingSegment { segment, .. } => {
                assert_eq!(segment, "staticResourceGroups")
            }
            other => panic!("Expected MissingSegment, got {:?}", other),
        }
    }

    #[test]
    fn strict_parsing_rejects_case_mismatch() {
        let input = "/subscriptions/sub/resourcegroups/rg";
        assert!(matches!(
            parse_segments("Resource Group", input, &group_segments(), false),
            Err(ParseError::UnexpectedSegment {
                segment: "staticResourceGroups",
                ..
            })
        ));
        assert!(parse_segments("Resource Group", input, &group_segments(), true).is_ok());
    }

    #[test]
    fn trailing_and_empty_segments_are_rejected() {
        assert!(matches!(
            parse_segments(
                "Resource Group",
                "/subscriptions/sub/resourceGroups/rg/extra",
                &group_segments(),
                false
            ),
            Err(ParseError::TrailingSegments { .. })
        ));
        assert!(matches!(
            parse_segments(
                "Resource Group",
                "/subscriptions//resourceGroups/rg",
                &group_segments(),
                false
            ),
            Err(ParseError::EmptySegment {
                segment: "subscriptionId",
                ..
            })
        ));
        assert!(matches!(
            parse_segments("Resource Group", "", &group_segments(), false),
            Err(ParseError::Empty { .. })
        ));
    }
}
