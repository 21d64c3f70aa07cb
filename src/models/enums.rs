use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + ALL pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(ConsentKind {
    ReceiveServices => "receive_services",
    PortalServiceBooking => "portal_service_booking",
    EmergencyAssistance => "emergency_assistance",
    FirstAid => "first_aid",
    DiscussWithProviders => "discuss_with_providers",
    SmokeFreeHome => "smoke_free_home",
    EmergencyResponsePlan => "emergency_response_plan",
    Photography => "photography",
    ShareDetails => "share_details",
});

impl ConsentKind {
    /// Opening words of the consent statement as printed on the intake form.
    pub fn statement(&self) -> &'static str {
        match self {
            Self::ReceiveServices => "I agree to receive services from Neighbourhood Care.",
            Self::PortalServiceBooking => {
                "I consent for Neighbourhood Care to create an NDIS portal service booking"
            }
            Self::EmergencyAssistance => {
                "I understand that if at any time I (The Participant) require emergency medical assistance"
            }
            Self::FirstAid => {
                "I agree that Neighbourhood Care staff may administer simple first aid"
            }
            Self::DiscussWithProviders => {
                "I consent for Neighbourhood Care to discuss relevant information"
            }
            Self::SmokeFreeHome => "I agree not to smoke inside the home",
            Self::EmergencyResponsePlan => {
                "I understand that an Emergency Response Plan will be developed"
            }
            Self::Photography => {
                "I consent for Neighbourhood Care for I (The Participant) to be photographed"
            }
            Self::ShareDetails => "I give authority for my details or information to be shared",
        }
    }
}

str_enum!(ContactMethod {
    HomePhone => "home_phone",
    MobilePhone => "mobile_phone",
    WorkPhone => "work_phone",
    Email => "email",
});

impl ContactMethod {
    /// Interpret a free-text "preferred method of contact" answer.
    pub fn from_free_text(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        if lower.contains("home phone") {
            Some(Self::HomePhone)
        } else if lower.contains("mobile") {
            Some(Self::MobilePhone)
        } else if lower.contains("email") {
            Some(Self::Email)
        } else if lower.contains("work phone") {
            Some(Self::WorkPhone)
        } else {
            None
        }
    }
}

str_enum!(SigningParty {
    Participant => "participant",
    PrimaryCarer => "primary_carer",
    Other => "other",
});

impl SigningParty {
    pub fn from_free_text(text: &str) -> Self {
        match text.trim().to_lowercase().as_str() {
            "participant" => Self::Participant,
            "primary carer" => Self::PrimaryCarer,
            _ => Self::Other,
        }
    }
}

str_enum!(ReferenceKind {
    Staff => "staff",
    SupportItem => "support_item",
});
