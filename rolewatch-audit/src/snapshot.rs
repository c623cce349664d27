//! Role snapshot parser
//!
//! Reads the RBAC section of a configuration document into a [`RoleMap`]:
//!
//! ```text
//! <roleMap type="globalRoles">
//!   <role name="admin" pattern=".*">
//!     <permissions><permission>hudson.model.Hudson.Administer</permission></permissions>
//!     <assignedSIDs><sid>alice</sid></assignedSIDs>
//!   </role>
//! </roleMap>
//! ```
//!
//! `roleMap` elements are found at any depth. Roles, permissions and SIDs
//! are collected from descendants, so wrapper elements such as
//! `permissions` or `assignedSIDs` need not be present. Anything else in the
//! document is ignored.

use crate::role::{RoleInfo, RoleMap};
use crate::{AuditError, AuditResult};
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::collections::BTreeMap;
use std::path::Path;

/// Parse a configuration document.
///
/// # Examples
///
/// ```
/// use rolewatch_audit::{RoleScope, parse_snapshot};
///
/// let roles = parse_snapshot(r#"
///     <hudson>
///       <roleMap type="globalRoles">
///         <role name="admin" pattern=".*">
///           <permission>read</permission>
///           <sid>alice</sid>
///         </role>
///       </roleMap>
///     </hudson>
/// "#).unwrap();
///
/// let admin = roles.role(RoleScope::Global, "admin").unwrap();
/// assert!(admin.permissions.contains("read"));
/// assert!(admin.principals.contains("alice"));
/// ```
pub fn parse_snapshot(xml: &str) -> AuditResult<RoleMap> {
    let mut reader = Reader::from_str(xml);
    let mut state = ParseState::default();
    let mut depth = 0usize;
    let mut seen_root = false;

    loop {
        let event = reader.read_event().map_err(|e| {
            AuditError::Parse(format!("at byte {}: {}", reader.error_position(), e))
        })?;

        match event {
            Event::Start(e) => {
                seen_root = true;
                depth += 1;
                state.open(&e)?;
            }
            Event::Empty(e) => {
                seen_root = true;
                state.open(&e)?;
                state.close();
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                state.close();
            }
            Event::Text(e) => {
                let raw = String::from_utf8_lossy(&e);
                let text = unescape(&raw).map_err(|err| AuditError::Parse(err.to_string()))?;
                state.text(&text);
            }
            Event::CData(e) => state.text(&String::from_utf8_lossy(&e)),
            Event::GeneralRef(e) => {
                let entity = format!("&{};", String::from_utf8_lossy(&e));
                let text = unescape(&entity).map_err(|err| AuditError::Parse(err.to_string()))?;
                state.text(&text);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth != 0 {
        return Err(AuditError::Parse(format!(
            "unexpected end of document with {} unclosed element(s)",
            depth
        )));
    }
    if !seen_root {
        return Err(AuditError::Parse("document has no root element".to_string()));
    }

    Ok(state.finish())
}

/// Read and parse a configuration document from disk.
pub fn parse_snapshot_file(path: &Path) -> AuditResult<RoleMap> {
    let xml = std::fs::read_to_string(path)?;
    parse_snapshot(&xml)
}

#[derive(Debug, Clone, Copy)]
enum ValueKind {
    Permission,
    Sid,
}

#[derive(Debug)]
enum Frame {
    Group {
        key: String,
        order: usize,
        roles: BTreeMap<String, RoleInfo>,
    },
    Role(RoleInfo),
    Value {
        kind: ValueKind,
        text: String,
    },
    Other,
}

#[derive(Debug, Default)]
struct ParseState {
    stack: Vec<Frame>,
    groups_opened: usize,
    finished: Vec<(usize, String, BTreeMap<String, RoleInfo>)>,
}

impl ParseState {
    fn open(&mut self, element: &BytesStart<'_>) -> AuditResult<()> {
        let frame = match element.local_name().as_ref() {
            b"roleMap" => {
                let order = self.groups_opened;
                self.groups_opened += 1;
                Frame::Group {
                    key: attribute(element, b"type")?,
                    order,
                    roles: BTreeMap::new(),
                }
            }
            b"role" => Frame::Role(RoleInfo::new(
                attribute(element, b"name")?,
                attribute(element, b"pattern")?,
            )),
            b"permission" => Frame::Value {
                kind: ValueKind::Permission,
                text: String::new(),
            },
            b"sid" => Frame::Value {
                kind: ValueKind::Sid,
                text: String::new(),
            },
            _ => Frame::Other,
        };

        self.stack.push(frame);
        Ok(())
    }

    fn text(&mut self, text: &str) {
        for frame in self.stack.iter_mut() {
            if let Frame::Value { text: buffer, .. } = frame {
                buffer.push_str(text);
            }
        }
    }

    fn close(&mut self) {
        match self.stack.pop() {
            Some(Frame::Value { kind, text }) => {
                // kept verbatim: whitespace is part of the value
                for frame in self.stack.iter_mut() {
                    if let Frame::Role(role) = frame {
                        match kind {
                            ValueKind::Permission => role.permissions.insert(text.clone()),
                            ValueKind::Sid => role.principals.insert(text.clone()),
                        };
                    }
                }
            }
            Some(Frame::Role(role)) => {
                for frame in self.stack.iter_mut() {
                    if let Frame::Group { roles, .. } = frame {
                        roles.insert(role.name.clone(), role.clone());
                    }
                }
            }
            Some(Frame::Group { key, order, roles }) => {
                self.finished.push((order, key, roles));
            }
            Some(Frame::Other) | None => {}
        }
    }

    fn finish(mut self) -> RoleMap {
        // A later roleMap with the same type replaces an earlier one.
        self.finished.sort_by_key(|(order, _, _)| *order);

        let mut map = RoleMap::new();
        for (_, key, roles) in self.finished {
            map.insert_group(key, roles);
        }
        map
    }
}

fn attribute(element: &BytesStart<'_>, name: &[u8]) -> AuditResult<String> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| AuditError::Parse(e.to_string()))?;
        if attr.key.local_name().as_ref() == name {
            let raw = String::from_utf8_lossy(&attr.value);
            let value = unescape(&raw).map_err(|e| AuditError::Parse(e.to_string()))?;
            return Ok(value.into_owned());
        }
    }
    Ok(String::new())
}
