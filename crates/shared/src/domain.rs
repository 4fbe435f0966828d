use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }
        }
    };
}

id_newtype!(EnrollmentId);
id_newtype!(BorrowerId);
id_newtype!(DealerId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    Active,
    PaidExit,
    Escalated,
    Suppressed,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::PaidExit => "PAID_EXIT",
            Self::Escalated => "ESCALATED",
            Self::Suppressed => "SUPPRESSED",
        }
    }

    /// Every status other than ACTIVE is an exit state; the server never
    /// moves an enrollment back out of one.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }
}

impl std::str::FromStr for EnrollmentStatus {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(Self::Active),
            "PAID_EXIT" => Ok(Self::PaidExit),
            "ESCALATED" => Ok(Self::Escalated),
            "SUPPRESSED" => Ok(Self::Suppressed),
            _ => Err(format!("unknown enrollment status '{raw}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TouchChannel {
    Sms,
    Email,
    Push,
    Call,
}

impl TouchChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sms => "SMS",
            Self::Email => "EMAIL",
            Self::Push => "PUSH",
            Self::Call => "CALL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallOutcome {
    NoAnswer,
    Voicemail,
    Busy,
    WrongNumber,
    PromiseToPay,
    Transferred,
    Refused,
}

impl CallOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoAnswer => "NO_ANSWER",
            Self::Voicemail => "VOICEMAIL",
            Self::Busy => "BUSY",
            Self::WrongNumber => "WRONG_NUMBER",
            Self::PromiseToPay => "PROMISE_TO_PAY",
            Self::Transferred => "TRANSFERRED",
            Self::Refused => "REFUSED",
        }
    }
}
