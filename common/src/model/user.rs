use serde::{Deserialize, Serialize};

/// Staff roles, ordered from widest to narrowest visibility.
///
/// Administrative and technician staff can browse every consent record;
/// specialists only ever see records they created themselves. User management is
/// restricted to the administrative role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Administrative,
    Technician,
    Specialist,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrative => "ADMINISTRATIVE",
            Role::Technician => "TECHNICIAN",
            Role::Specialist => "SPECIALIST",
        }
    }

    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "ADMINISTRATIVE" => Some(Role::Administrative),
            "TECHNICIAN" => Some(Role::Technician),
            "SPECIALIST" => Some(Role::Specialist),
            _ => None,
        }
    }
}

/// A staff account as exposed by the API. The password hash never leaves the
/// backend and is deliberately not part of this struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: String,
    pub username: String,
    pub given_names: String,
    pub first_surname: String,
    pub second_surname: String,
    pub role: Role,
    pub active: bool,
}

/// Profile payload returned to a logged-in client, with the display names the
/// pages show pre-computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub given_names: String,
    pub first_surname: String,
    pub second_surname: String,
    /// First given name plus first surname.
    pub display_name: String,
    /// All given names plus both surnames.
    pub full_name: String,
}

impl Profile {
    /// Builds a profile from the raw name parts, collapsing runs of whitespace
    /// so that an absent second surname does not leave a trailing gap.
    pub fn assemble(
        id: String,
        username: String,
        role: Role,
        given_names: &str,
        first_surname: &str,
        second_surname: &str,
    ) -> Profile {
        let first_given = given_names.split_whitespace().next().unwrap_or("");
        let display_name = collapse(&format!("{} {}", first_given, first_surname));
        let full_name = collapse(&format!(
            "{} {} {}",
            given_names, first_surname, second_surname
        ));
        Profile {
            id,
            username,
            role,
            given_names: given_names.trim().to_string(),
            first_surname: first_surname.trim().to_string(),
            second_surname: second_surname.trim().to_string(),
            display_name,
            full_name,
        }
    }
}

fn collapse(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::Administrative, Role::Technician, Role::Specialist] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("INTERN"), None);
    }

    #[test]
    fn profile_derives_display_names() {
        let profile = Profile::assemble(
            "u1".into(),
            "mgarcia".into(),
            Role::Specialist,
            "Maria Fernanda",
            "Garcia",
            "Lopez",
        );
        assert_eq!(profile.display_name, "Maria Garcia");
        assert_eq!(profile.full_name, "Maria Fernanda Garcia Lopez");
    }

    #[test]
    fn profile_tolerates_missing_second_surname() {
        let profile = Profile::assemble(
            "u2".into(),
            "jdoe".into(),
            Role::Technician,
            "Juan",
            "Perez",
            "",
        );
        assert_eq!(profile.full_name, "Juan Perez");
    }
}
