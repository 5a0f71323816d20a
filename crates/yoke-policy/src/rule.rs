//! Blocklist rules
//!
//! A rule is either a case-insensitive regular expression (built-ins) or a
//! case-insensitive substring (operator-supplied patterns). Both are matched
//! against the full command text, arguments included.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// What kind of harm a rule guards against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    DestructiveDeletion,
    DiskDestruction,
    PrivilegeEscalation,
    CredentialAccess,
    NetworkExfiltration,
    RemoteCodeExecution,
    SystemControl,
    /// Supplied through configuration
    Custom,
}

#[derive(Debug, Clone)]
enum RuleMatcher {
    Pattern(Regex),
    /// Stored lowercased
    Substring(String),
}

/// A single blocklist rule
#[derive(Debug, Clone)]
pub struct BlockRule {
    pub id: String,
    pub description: String,
    pub category: RuleCategory,
    matcher: RuleMatcher,
}

impl BlockRule {
    /// Regex rule. The pattern is compiled case-insensitive.
    pub fn pattern(
        id: impl Into<String>,
        description: impl Into<String>,
        category: RuleCategory,
        pattern: &str,
    ) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("(?i){}", pattern))?;
        Ok(Self {
            id: id.into(),
            description: description.into(),
            category,
            matcher: RuleMatcher::Pattern(regex),
        })
    }

    /// Substring rule for an operator-supplied blocked command.
    pub fn substring(pattern: &str) -> Self {
        let needle = pattern.trim().to_lowercase();
        Self {
            id: format!("custom:{}", needle),
            description: format!("'{}' is blocked by configuration", pattern.trim()),
            category: RuleCategory::Custom,
            matcher: RuleMatcher::Substring(needle),
        }
    }

    pub fn matches(&self, command: &str) -> bool {
        match &self.matcher {
            RuleMatcher::Pattern(regex) => regex.is_match(command),
            RuleMatcher::Substring(needle) => {
                !needle.is_empty() && command.to_lowercase().contains(needle.as_str())
            }
        }
    }
}

fn builtin(id: &str, description: &str, category: RuleCategory, pattern: &str) -> BlockRule {
    BlockRule::pattern(id, description, category, pattern).unwrap()
}

/// Built-in destructive and exfiltration-prone command patterns
pub static BUILTIN_RULES: Lazy<Vec<BlockRule>> = Lazy::new(|| {
    vec![
        builtin(
            "destructive-deletion",
            "recursive deletion of a root, home or workspace path",
            RuleCategory::DestructiveDeletion,
            r#"\brm\s+(?:-{1,2}[\w-]+\s+)*(?:-[a-z]*r[a-z]*|--recursive)\s+(?:-{1,2}[\w-]+\s+)*(?:--\s+)?["']?(?:/\*?|~/?\*?|\$\{?home\}?/?\*?|\*|\.\.?/?\*?)["']?(?:\s|$|[;&|)`])"#,
        ),
        builtin(
            "disk-destruction",
            "formatting or overwriting a block device",
            RuleCategory::DiskDestruction,
            r"\b(?:mkfs(?:\.\w+)?|fdisk|wipefs)\b|\bdd\b[^;&|]*\bof=/dev/|>\s*/dev/(?:sd|hd|nvme|disk)",
        ),
        builtin(
            "fork-bomb",
            "shell fork bomb",
            RuleCategory::SystemControl,
            r":\(\)\s*\{\s*:\s*\|\s*:\s*&\s*\}\s*;\s*:",
        ),
        builtin(
            "privilege-escalation",
            "running commands as another user",
            RuleCategory::PrivilegeEscalation,
            r"\b(?:sudo|doas)\b|(?:^|[;&|]\s*)su(?:\s|$)",
        ),
        builtin(
            "permission-clobber",
            "world-writable permissions on the filesystem root",
            RuleCategory::PrivilegeEscalation,
            r"\bchmod\s+(?:-[\w-]+\s+)*0?777\s+/(?:\s|$|\*|[;&|)`])",
        ),
        builtin(
            "credential-access",
            "reading private keys or credential stores",
            RuleCategory::CredentialAccess,
            r"\.ssh/|\bid_(?:rsa|dsa|ecdsa|ed25519)\b|\.aws/credentials|\.netrc\b|/etc/shadow|\.gnupg/|\.git-credentials|\.docker/config\.json",
        ),
        builtin(
            "secret-environment",
            "reading agent secrets from the environment",
            RuleCategory::CredentialAccess,
            r"\$\{?(?:anthropic_api_key|claude_code_oauth_token|aws_secret_access_key|e2b_api_key)\b|\bprintenv\s*(?:$|[|;&>])",
        ),
        builtin(
            "network-exfiltration",
            "raw sockets or uploading local files to a remote host",
            RuleCategory::NetworkExfiltration,
            r"\b(?:nc|ncat|netcat|socat|telnet)\b|/dev/(?:tcp|udp)/|\bcurl\b[^;&|]*(?:\s-d\s*@|\s--data(?:-binary|-raw|-urlencode)?[\s=]+@|\s-F\s*\S+=@|\s--form\s+\S+=@|\s-T\s|\s--upload-file\s)|\bwget\b[^;&|]*--post-file|\b(?:scp|rsync)\b[^;&|]*\s\S+@\S+:",
        ),
        builtin(
            "remote-code-execution",
            "piping downloaded content into a shell",
            RuleCategory::RemoteCodeExecution,
            r"\b(?:curl|wget)\b[^;&|]*\|\s*(?:sudo\s+)?(?:ba|z|da)?sh\b",
        ),
        builtin(
            "system-control",
            "shutting down the host or killing every process",
            RuleCategory::SystemControl,
            r"\b(?:shutdown|reboot|halt|poweroff)\b|\bkill\s+-9\s+-1\b",
        ),
    ]
});
