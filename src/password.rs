//! Password handling: scoped secret type, readers and strength policy

use crate::consts::MIN_PASSWORD_CHARS;
use crate::error::{ErrorCategory, ErrorKind, KeepsakeError, Result};
use std::fmt;
use std::io::{self, IsTerminal, Read, Write};
use zeroize::{Zeroize, Zeroizing};

/// Characters that count as "special" for the strength policy.
const SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";

/// A password held only for the duration of a seal or open call.
///
/// The backing buffer is wiped when the value is dropped, on every exit
/// path. `Debug` never prints the contents.
#[derive(Clone)]
pub struct Password(Zeroizing<String>);

impl Password {
    pub fn new(password: impl Into<String>) -> Self {
        Self(Zeroizing::new(password.into()))
    }

    /// Converts raw bytes into a password, wiping the bytes if they are not UTF-8.
    pub fn from_utf8(mut bytes: Zeroizing<Vec<u8>>) -> Result<Self> {
        let raw = std::mem::take(&mut *bytes);
        match String::from_utf8(raw) {
            Ok(s) => Ok(Self::new(s)),
            Err(e) => {
                let mut raw = e.into_bytes();
                raw.zeroize();
                Err(KeepsakeError::with_kind(
                    ErrorCategory::User,
                    ErrorKind::PasswordUnavailable,
                    "password is not valid UTF-8",
                ))
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Checks a new password against the minimum strength policy.
///
/// The policy is applied by the sealing side only: at least
/// `MIN_PASSWORD_CHARS` characters, an uppercase and a lowercase letter, and
/// a digit or one of the special characters. Opening a record never checks
/// strength.
pub fn check_password_strength(password: &str) -> Result<()> {
    // Counted in UTF-16 code units to match the browser encoder.
    if password.encode_utf16().count() < MIN_PASSWORD_CHARS {
        return Err(KeepsakeError::with_kind(
            ErrorCategory::User,
            ErrorKind::WeakPassword,
            format!("password must be at least {MIN_PASSWORD_CHARS} characters long"),
        ));
    }

    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| SPECIAL_CHARS.contains(c));

    if !(has_upper && has_lower && (has_digit || has_special)) {
        return Err(KeepsakeError::with_kind(
            ErrorCategory::User,
            ErrorKind::WeakPassword,
            "password should contain uppercase, lowercase, and numbers or special characters",
        ));
    }

    Ok(())
}

/// Trait for reading passwords from various sources
pub trait PasswordReader {
    /// Read a password.
    ///
    /// Returns the password wrapped in `Password` so it is securely wiped
    /// from memory when dropped.
    fn read_password(&mut self) -> Result<Password>;
}

/// Returns a fixed password (for testing)
pub struct ConstantPasswordReader {
    password: Password,
}

impl ConstantPasswordReader {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: Password::new(password),
        }
    }
}

impl PasswordReader for ConstantPasswordReader {
    fn read_password(&mut self) -> Result<Password> {
        Ok(self.password.clone())
    }
}

/// Reads a password from any io::Read source until EOF.
///
/// A single trailing line terminator (`\n` or `\r\n`) is dropped, so
/// `echo "$PASSWORD" | keepsake --password-stdin ...` yields the same key
/// as typing the password into the viewer.
pub struct ReaderPasswordReader {
    reader: Box<dyn Read>,
}

impl ReaderPasswordReader {
    pub fn new(reader: Box<dyn Read>) -> Self {
        Self { reader }
    }
}

impl PasswordReader for ReaderPasswordReader {
    fn read_password(&mut self) -> Result<Password> {
        let mut data = Zeroizing::new(Vec::new());
        self.reader.read_to_end(&mut data).map_err(|e| {
            KeepsakeError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("error reading password: {}", e),
                e,
            )
        })?;
        if data.ends_with(b"\n") {
            data.pop();
            if data.ends_with(b"\r") {
                data.pop();
            }
        }
        Password::from_utf8(data)
    }
}

/// Reads a password from the terminal with no echo
pub struct TerminalPasswordReader {
    prompt: String,
}

impl TerminalPasswordReader {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

impl Default for TerminalPasswordReader {
    fn default() -> Self {
        Self::new("Password (keepsake): ")
    }
}

impl PasswordReader for TerminalPasswordReader {
    fn read_password(&mut self) -> Result<Password> {
        if !io::stdin().is_terminal() {
            return Err(KeepsakeError::with_kind(
                ErrorCategory::User,
                ErrorKind::PasswordUnavailable,
                "cannot read password from terminal - stdin is not a terminal",
            ));
        }

        let mut stderr = io::stderr();
        stderr
            .write_all(self.prompt.as_bytes())
            .and_then(|()| stderr.flush())
            .map_err(|e| {
                KeepsakeError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    format!("failed to write prompt: {}", e),
                    e,
                )
            })?;

        // rpassword hands back a plain String; move it straight into the
        // zeroizing wrapper.
        let password = rpassword::read_password().map_err(|e| {
            KeepsakeError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::PasswordUnavailable,
                format!("failure reading password: {}", e),
                e,
            )
        })?;

        Ok(Password::new(password))
    }
}

/// Wraps another PasswordReader and caches the result
///
/// Provides "at most once" semantics - the upstream reader is called
/// only on the first successful invocation, and subsequent calls return the
/// cached value. The cached password is wiped when this reader is dropped.
pub struct CachingPasswordReader {
    upstream: Box<dyn PasswordReader>,
    cached: Option<Password>,
}

impl CachingPasswordReader {
    pub fn new(upstream: Box<dyn PasswordReader>) -> Self {
        Self {
            upstream,
            cached: None,
        }
    }
}

impl PasswordReader for CachingPasswordReader {
    fn read_password(&mut self) -> Result<Password> {
        if let Some(cached) = &self.cached {
            return Ok(cached.clone());
        }
        let password = self.upstream.read_password()?;
        self.cached = Some(password.clone());
        Ok(password)
    }
}
