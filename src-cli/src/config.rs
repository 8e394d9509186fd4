//! Static provider knowledge: IMAP hosts per mail domain and the setup
//! notes shown when sign-in needs provider-specific preparation.

/// Connection details and setup notes for one mail provider domain.
pub struct ProviderConfig {
    pub domain: &'static str,
    pub host: &'static str,
    pub port: u16,
    pub notes: &'static [&'static str],
}

pub const PROVIDERS: &[ProviderConfig] = &[
    ProviderConfig {
        domain: "gmail.com",
        host: "imap.gmail.com",
        port: 993,
        notes: &[
            "Use an App Password instead of your regular password",
            "Enable 2-factor authentication first",
            "Google Account > Security > App passwords, generate one for Mail",
        ],
    },
    ProviderConfig {
        domain: "outlook.com",
        host: "outlook.office365.com",
        port: 993,
        notes: &[
            "Regular password should work",
            "With 2FA enabled you may need an app password",
        ],
    },
    ProviderConfig {
        domain: "hotmail.com",
        host: "outlook.office365.com",
        port: 993,
        notes: &[
            "Regular password should work",
            "With 2FA enabled you may need an app password",
        ],
    },
    ProviderConfig {
        domain: "live.com",
        host: "outlook.office365.com",
        port: 993,
        notes: &[
            "Regular password should work",
            "With 2FA enabled you may need an app password",
        ],
    },
    ProviderConfig {
        domain: "yahoo.com",
        host: "imap.mail.yahoo.com",
        port: 993,
        notes: &[
            "Generate an App Password under Yahoo Account Security",
            "Use the app password instead of your regular password",
        ],
    },
    ProviderConfig {
        domain: "icloud.com",
        host: "imap.mail.me.com",
        port: 993,
        notes: &[
            "Use an App-Specific Password",
            "Apple ID > Sign-In and Security > App-Specific Passwords",
        ],
    },
    ProviderConfig {
        domain: "me.com",
        host: "imap.mail.me.com",
        port: 993,
        notes: &[
            "Use an App-Specific Password",
            "Apple ID > Sign-In and Security > App-Specific Passwords",
        ],
    },
    ProviderConfig {
        domain: "aol.com",
        host: "imap.aol.com",
        port: 993,
        notes: &[
            "You may need to enable IMAP in your AOL mail settings",
            "Use your regular AOL password",
        ],
    },
];

fn domain_of(email: &str) -> String {
    match email.split_once('@') {
        Some((_, domain)) => domain.to_lowercase(),
        None => email.to_lowercase(),
    }
}

/// Known provider for an address, if any.
pub fn provider_for(email: &str) -> Option<&'static ProviderConfig> {
    let domain = domain_of(email);
    PROVIDERS.iter().find(|p| p.domain == domain)
}

/// IMAP host for an address: provider table first, `imap.<domain>` fallback.
pub fn detect_imap_server(email: &str) -> String {
    match provider_for(email) {
        Some(provider) => provider.host.to_string(),
        None => format!("imap.{}", domain_of(email)),
    }
}

/// Remediation guidance printed when every connection strategy failed.
pub fn connection_help(email: &str) -> String {
    let mut out = String::new();
    out.push_str("Could not sign in. Things to check:\n");
    out.push_str("  - The password is correct (many providers require an app password here)\n");
    out.push_str("  - IMAP access is enabled in the account's mail settings\n");
    out.push_str("  - Your account admin has not disabled external mail clients\n");
    if let Some(provider) = provider_for(email) {
        out.push_str(&format!("\nNotes for {}:\n", provider.domain));
        for note in provider.notes {
            out.push_str(&format!("  - {}\n", note));
        }
    }
    out
}
