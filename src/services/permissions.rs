//! Static role to permission table consulted before every gated operation.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Role {
    Admin,
    Teacher,
    Assistant,
    Student,
}

impl Role {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Teacher => "teacher",
            Self::Assistant => "assistant",
            Self::Student => "student",
        }
    }

    /// Staff roles see unpublished quizzes, correct answers and everyone's attempts.
    pub(crate) fn is_privileged(self) -> bool {
        matches!(self, Self::Admin | Self::Teacher | Self::Assistant)
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Self::Admin),
            "teacher" => Ok(Self::Teacher),
            "assistant" => Ok(Self::Assistant),
            "student" => Ok(Self::Student),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UnknownRole(pub(crate) String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Permission {
    CourseRead,
    CourseWrite,
    AiUse,
    SimUse,
    AssignmentRead,
    AssignmentWrite,
    AssignmentSubmit,
    AssignmentGrade,
    ResourceRead,
    ResourceWrite,
    CodeRun,
    QuizRead,
    QuizWrite,
    QuizTake,
    QuizGrade,
    UserStats,
    UserManage,
    AnnouncementRead,
    AnnouncementWrite,
    AttendanceRead,
    AttendanceWrite,
    AttendanceCheckin,
    AttendanceExport,
}

impl Permission {
    /// The permission universe; the admin wildcard expands to exactly this list.
    pub(crate) const ALL: [Permission; 23] = [
        Self::CourseRead,
        Self::CourseWrite,
        Self::AiUse,
        Self::SimUse,
        Self::AssignmentRead,
        Self::AssignmentWrite,
        Self::AssignmentSubmit,
        Self::AssignmentGrade,
        Self::ResourceRead,
        Self::ResourceWrite,
        Self::CodeRun,
        Self::QuizRead,
        Self::QuizWrite,
        Self::QuizTake,
        Self::QuizGrade,
        Self::UserStats,
        Self::UserManage,
        Self::AnnouncementRead,
        Self::AnnouncementWrite,
        Self::AttendanceRead,
        Self::AttendanceWrite,
        Self::AttendanceCheckin,
        Self::AttendanceExport,
    ];

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::CourseRead => "course:read",
            Self::CourseWrite => "course:write",
            Self::AiUse => "ai:use",
            Self::SimUse => "sim:use",
            Self::AssignmentRead => "assignment:read",
            Self::AssignmentWrite => "assignment:write",
            Self::AssignmentSubmit => "assignment:submit",
            Self::AssignmentGrade => "assignment:grade",
            Self::ResourceRead => "resource:read",
            Self::ResourceWrite => "resource:write",
            Self::CodeRun => "code:run",
            Self::QuizRead => "quiz:read",
            Self::QuizWrite => "quiz:write",
            Self::QuizTake => "quiz:take",
            Self::QuizGrade => "quiz:grade",
            Self::UserStats => "user:stats",
            Self::UserManage => "user:manage",
            Self::AnnouncementRead => "announcement:read",
            Self::AnnouncementWrite => "announcement:write",
            Self::AttendanceRead => "attendance:read",
            Self::AttendanceWrite => "attendance:write",
            Self::AttendanceCheckin => "attendance:checkin",
            Self::AttendanceExport => "attendance:export",
        }
    }
}

impl Serialize for Permission {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

enum Grant {
    Wildcard,
    Only(&'static [Permission]),
}

const TEACHER: &[Permission] = &[
    Permission::CourseRead,
    Permission::CourseWrite,
    Permission::AiUse,
    Permission::SimUse,
    Permission::AssignmentRead,
    Permission::AssignmentWrite,
    Permission::AssignmentGrade,
    Permission::ResourceRead,
    Permission::ResourceWrite,
    Permission::CodeRun,
    Permission::QuizRead,
    Permission::QuizWrite,
    Permission::QuizGrade,
    Permission::UserStats,
    Permission::AnnouncementRead,
    Permission::AnnouncementWrite,
    Permission::AttendanceRead,
    Permission::AttendanceWrite,
    Permission::AttendanceExport,
];

const ASSISTANT: &[Permission] = &[
    Permission::CourseRead,
    Permission::AiUse,
    Permission::SimUse,
    Permission::AssignmentRead,
    Permission::AssignmentGrade,
    Permission::ResourceRead,
    Permission::CodeRun,
    Permission::QuizRead,
    Permission::QuizGrade,
    Permission::UserStats,
];

const STUDENT: &[Permission] = &[
    Permission::CourseRead,
    Permission::AiUse,
    Permission::SimUse,
    Permission::AssignmentRead,
    Permission::AssignmentSubmit,
    Permission::ResourceRead,
    Permission::CodeRun,
    Permission::QuizRead,
    Permission::QuizTake,
    Permission::UserStats,
    Permission::AnnouncementRead,
    Permission::AttendanceRead,
    Permission::AttendanceCheckin,
];

fn grant_for(role: Role) -> Grant {
    match role {
        Role::Admin => Grant::Wildcard,
        Role::Teacher => Grant::Only(TEACHER),
        Role::Assistant => Grant::Only(ASSISTANT),
        Role::Student => Grant::Only(STUDENT),
    }
}

/// Roles outside the fixed enumeration hold no permissions.
pub(crate) fn has_permission(role: &str, permission: Permission) -> bool {
    let Ok(role) = role.parse::<Role>() else {
        return false;
    };

    match grant_for(role) {
        Grant::Wildcard => true,
        Grant::Only(granted) => granted.contains(&permission),
    }
}

pub(crate) fn get_permissions(role: &str) -> Vec<Permission> {
    let Ok(role) = role.parse::<Role>() else {
        return Vec::new();
    };

    match grant_for(role) {
        Grant::Wildcard => Permission::ALL.to_vec(),
        Grant::Only(granted) => granted.to_vec(),
    }
}
