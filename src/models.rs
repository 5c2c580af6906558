use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Canonical user role.
///
/// The service spells the admin role inconsistently ("admin", "Admin"), so
/// every spelling is folded into [`Role::Admin`] when the value is decoded.
/// Unknown or missing roles fall back to [`Role::User`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("admin") {
            Role::Admin
        } else {
            Role::User
        }
    }

    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Role::parse).unwrap_or_default())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the document id; the service may send `_id`, `id` or both.
fn document_id(mongo_id: Option<String>, id: Option<String>) -> Result<String, String> {
    mongo_id
        .or(id)
        .ok_or_else(|| "missing field `_id` or `id`".to_string())
}

/// An authenticated user as returned by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UserWire")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

#[derive(Deserialize)]
struct UserWire {
    #[serde(rename = "_id")]
    mongo_id: Option<String>,
    id: Option<String>,
    #[serde(default)]
    email: String,
    #[serde(default)]
    role: Role,
    #[serde(default)]
    name: Option<String>,
}

impl TryFrom<UserWire> for User {
    type Error = String;

    fn try_from(wire: UserWire) -> Result<Self, Self::Error> {
        Ok(User {
            id: document_id(wire.mongo_id, wire.id)?,
            email: wire.email,
            role: wire.role,
            name: wire.name,
        })
    }
}

/// A user field that the service sends either as a bare id or as an
/// embedded (populated) user document. `null` or a missing field (a deleted
/// user) is `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum UserRef {
    Reference(String),
    Embedded(User),
    #[default]
    Unknown,
}

impl UserRef {
    /// Empty for an unknown user
    pub fn id(&self) -> &str {
        match self {
            UserRef::Reference(id) => id,
            UserRef::Embedded(user) => &user.id,
            UserRef::Unknown => "",
        }
    }

    /// Name, then email, then id.
    pub fn display_name(&self) -> &str {
        match self {
            UserRef::Reference(id) => id,
            UserRef::Embedded(user) => match user.name.as_deref() {
                Some(name) if !name.is_empty() => name,
                _ if !user.email.is_empty() => &user.email,
                _ => &user.id,
            },
            UserRef::Unknown => "unknown",
        }
    }

    pub fn refers_to(&self, user: &User) -> bool {
        !matches!(self, UserRef::Unknown) && self.id() == user.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Closed,
}

impl TicketStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in-progress",
            TicketStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "open" => Ok(TicketStatus::Open),
            "in-progress" => Ok(TicketStatus::InProgress),
            "closed" => Ok(TicketStatus::Closed),
            other => Err(format!(
                "unknown ticket status '{other}' (expected open, in-progress or closed)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!(
                "unknown priority '{other}' (expected low, medium or high)"
            )),
        }
    }
}

/// A helpdesk ticket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "TicketWire")]
pub struct Ticket {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: Priority,
    /// Bare id for regular users, populated user for admins
    pub created_by: UserRef,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TicketWire {
    #[serde(rename = "_id")]
    mongo_id: Option<String>,
    id: Option<String>,
    title: String,
    description: String,
    status: TicketStatus,
    #[serde(default)]
    priority: Priority,
    #[serde(default)]
    created_by: UserRef,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TicketWire> for Ticket {
    type Error = String;

    fn try_from(wire: TicketWire) -> Result<Self, Self::Error> {
        Ok(Ticket {
            id: document_id(wire.mongo_id, wire.id)?,
            title: wire.title,
            description: wire.description,
            status: wire.status,
            priority: wire.priority,
            created_by: wire.created_by,
            created_at: wire.created_at,
            updated_at: wire.updated_at,
        })
    }
}

/// Payload for creating a ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
}

impl NewTicket {
    pub fn new(title: impl Into<String>, description: impl Into<String>, priority: Priority) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            priority,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title is required".to_string());
        }
        if self.description.trim().is_empty() {
            return Err("description is required".to_string());
        }
        Ok(())
    }
}

/// One entry of the server-side audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "AuditLogWire")]
pub struct AuditLogEntry {
    pub id: String,
    pub user_id: UserRef,
    pub action: String,
    /// Opaque structured payload, rendered as-is
    pub details: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    pub user_role: Role,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuditLogWire {
    #[serde(rename = "_id")]
    mongo_id: Option<String>,
    id: Option<String>,
    #[serde(default)]
    user_id: UserRef,
    action: String,
    #[serde(default)]
    details: serde_json::Value,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    user_role: Role,
}

impl TryFrom<AuditLogWire> for AuditLogEntry {
    type Error = String;

    fn try_from(wire: AuditLogWire) -> Result<Self, Self::Error> {
        Ok(AuditLogEntry {
            id: document_id(wire.mongo_id, wire.id)?,
            user_id: wire.user_id,
            action: wire.action,
            details: wire.details,
            timestamp: wire.timestamp,
            user_role: wire.user_role,
        })
    }
}

/// Availability flag of the primary database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStatus {
    pub primary_down: bool,
}

impl DatabaseStatus {
    pub fn label(&self) -> &'static str {
        if self.primary_down {
            "DOWN"
        } else {
            "UP"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_spellings_normalize() {
        for raw in ["admin", "Admin", "ADMIN", " admin "] {
            assert_eq!(Role::parse(raw), Role::Admin, "{raw}");
        }
        assert_eq!(Role::parse("user"), Role::User);
        assert_eq!(Role::parse("support"), Role::User);

        let user: User = serde_json::from_value(json!({"_id": "u1", "role": "Admin"})).unwrap();
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.id, "u1");

        let user: User = serde_json::from_value(json!({"id": "u2", "role": null})).unwrap();
        assert_eq!(user.role, Role::User);
    }

    #[test]
    fn test_user_serializes_canonical_role() {
        let user = User {
            id: "u1".to_string(),
            email: "a@x.com".to_string(),
            role: Role::parse("Admin"),
            name: None,
        };
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value, json!({"id": "u1", "email": "a@x.com", "role": "admin"}));
    }

    #[test]
    fn test_user_ref_decodes_both_shapes() {
        let reference: UserRef = serde_json::from_value(json!("u7")).unwrap();
        assert_eq!(reference, UserRef::Reference("u7".to_string()));
        assert_eq!(reference.display_name(), "u7");

        let embedded: UserRef =
            serde_json::from_value(json!({"_id": "u8", "email": "b@x.com"})).unwrap();
        assert_eq!(embedded.id(), "u8");
        assert_eq!(embedded.display_name(), "b@x.com");

        let named: UserRef =
            serde_json::from_value(json!({"_id": "u9", "email": "c@x.com", "name": "Cee"}))
                .unwrap();
        assert_eq!(named.display_name(), "Cee");
    }

    #[test]
    fn test_ticket_decodes_service_shape() {
        let ticket: Ticket = serde_json::from_value(json!({
            "_id": "t1",
            "title": "Printer",
            "description": "Jammed",
            "status": "in-progress",
            "priority": "high",
            "createdBy": {"_id": "u1", "email": "a@x.com", "name": "Ann"},
            "createdAt": "2024-03-01T10:00:00.000Z",
            "updatedAt": "2024-03-01T11:00:00.000Z"
        }))
        .unwrap();

        assert_eq!(ticket.status, TicketStatus::InProgress);
        assert_eq!(ticket.priority, Priority::High);
        assert_eq!(ticket.created_by.display_name(), "Ann");
    }

    #[test]
    fn test_documents_carrying_both_id_keys() {
        let user: User = serde_json::from_value(json!({
            "_id": "u1",
            "id": "u1",
            "email": "a@x.com",
            "role": "user",
            "__v": 0
        }))
        .unwrap();
        assert_eq!(user.id, "u1");

        let ticket: Ticket = serde_json::from_value(json!({
            "_id": "t1",
            "id": "t1",
            "title": "Printer",
            "description": "Jammed",
            "status": "open",
            "priority": "low",
            "createdBy": {"_id": "u1", "id": "u1", "email": "a@x.com"},
            "createdAt": "2024-03-01T10:00:00.000Z",
            "updatedAt": "2024-03-01T10:00:00.000Z"
        }))
        .unwrap();
        assert_eq!(ticket.id, "t1");
        assert_eq!(ticket.created_by.id(), "u1");

        let entry: AuditLogEntry = serde_json::from_value(json!({
            "_id": "l1",
            "id": "l1",
            "userId": "u1",
            "action": "LOGIN",
            "timestamp": "2024-03-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(entry.id, "l1");
    }

    #[test]
    fn test_underscore_id_wins_over_plain_id() {
        let user: User = serde_json::from_value(json!({"_id": "mongo", "id": "virtual"})).unwrap();
        assert_eq!(user.id, "mongo");

        let missing = serde_json::from_value::<User>(json!({"email": "a@x.com"}));
        assert!(missing.is_err());
    }

    #[test]
    fn test_deleted_creator_is_unknown() {
        let ticket: Ticket = serde_json::from_value(json!({
            "_id": "t1",
            "title": "Printer",
            "description": "Jammed",
            "status": "closed",
            "priority": "medium",
            "createdBy": null,
            "createdAt": "2024-03-01T10:00:00Z",
            "updatedAt": "2024-03-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(ticket.created_by, UserRef::Unknown);
        assert_eq!(ticket.created_by.display_name(), "unknown");
        assert!(!ticket.created_by.refers_to(&User {
            id: String::new(),
            email: String::new(),
            role: Role::User,
            name: None,
        }));
    }

    #[test]
    fn test_user_round_trips_through_persisted_json() {
        let user = User {
            id: "u1".to_string(),
            email: "a@x.com".to_string(),
            role: Role::Admin,
            name: Some("Ann".to_string()),
        };
        let raw = serde_json::to_string(&user).unwrap();
        assert_eq!(serde_json::from_str::<User>(&raw).unwrap(), user);
    }

    #[test]
    fn test_status_and_priority_from_str() {
        assert_eq!("in progress".parse::<TicketStatus>(), Ok(TicketStatus::InProgress));
        assert_eq!("CLOSED".parse::<TicketStatus>(), Ok(TicketStatus::Closed));
        assert!("done".parse::<TicketStatus>().is_err());
        assert_eq!("High".parse::<Priority>(), Ok(Priority::High));
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn test_new_ticket_validation() {
        assert!(NewTicket::new("T", "D", Priority::Low).validate().is_ok());
        assert_eq!(
            NewTicket::new("  ", "D", Priority::Low).validate(),
            Err("title is required".to_string())
        );
        assert_eq!(
            NewTicket::new("T", "", Priority::Low).validate(),
            Err("description is required".to_string())
        );
    }

    #[test]
    fn test_database_status_wire_name() {
        let status: DatabaseStatus = serde_json::from_value(json!({"primaryDown": true})).unwrap();
        assert!(status.primary_down);
        assert_eq!(status.label(), "DOWN");
    }
}
