pub mod line;

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::PathBuf;

use secrecy::SecretString;
use tracing::debug;

use crate::error::GstLoginError;
use line::Field;

pub type Result<T> = std::result::Result<T, GstLoginError>;

/// Lookup key derivation: uppercase, all whitespace removed. Case- and
/// whitespace-insensitive resolution is a UX guarantee, not an accident.
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// One stored account, identified by its index. The trade name keeps its
/// original casing for display.
#[derive(Debug)]
pub struct CredentialRecord {
    pub index: u32,
    pub trade_name: String,
    pub username: Option<String>,
    pub password: Option<SecretString>,
}

impl CredentialRecord {
    /// A record is usable for login only with both username and password.
    pub fn is_complete(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }
}

/// Field subset for one upsert. `None` leaves the stored value untouched.
#[derive(Debug)]
pub struct AccountUpdate {
    pub trade_name: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted(u32),
    Updated(u32),
    Aborted,
}

/// File-backed credential store. The file is re-read on every operation and
/// rewritten whole (temp file + rename) on every update; there is no
/// in-process caching across operations.
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Opens the store at `path`, creating an empty file if none exists yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self { path: path.into() };
        if !store.path.exists() {
            store.write_lines(&[])?;
        }
        Ok(store)
    }

    /// Resolves a trade name, ignoring case and whitespace. When duplicate
    /// normalized names exist in the file, the last line wins.
    pub fn resolve(&self, input: &str) -> Result<Option<u32>> {
        let wanted = normalize(input);
        if wanted.is_empty() {
            return Ok(None);
        }
        let mut found = None;
        for entry in self.scan()? {
            if entry.field == Field::TradeName && normalize(&entry.value) == wanted {
                found = Some(entry.index);
            }
        }
        Ok(found)
    }

    /// Next available index: max over `Trade_Name_<i>` keys plus one, or 1
    /// on an empty store.
    pub fn next_index(&self) -> Result<u32> {
        let highest = self
            .scan()?
            .into_iter()
            .filter(|entry| entry.field == Field::TradeName)
            .map(|entry| entry.index)
            .max()
            .unwrap_or(0);
        Ok(highest + 1)
    }

    /// Reads one field of one account.
    pub fn read(&self, index: u32, field: Field) -> Result<Option<String>> {
        let mut found = None;
        for entry in self.scan()? {
            if entry.field == field && entry.index == index {
                found = Some(entry.value);
            }
        }
        Ok(found)
    }

    /// All accounts ascending by index. Only indices with a trade-name entry
    /// are listed; orphan username/password lines stay invisible.
    pub fn records(&self) -> Result<Vec<CredentialRecord>> {
        let mut trade_names: BTreeMap<u32, String> = BTreeMap::new();
        let mut usernames: HashMap<u32, String> = HashMap::new();
        let mut passwords: HashMap<u32, String> = HashMap::new();

        for entry in self.scan()? {
            match entry.field {
                Field::TradeName => {
                    trade_names.insert(entry.index, entry.value);
                }
                Field::Username => {
                    usernames.insert(entry.index, entry.value);
                }
                Field::Password => {
                    passwords.insert(entry.index, entry.value);
                }
            }
        }

        Ok(trade_names
            .into_iter()
            .map(|(index, trade_name)| CredentialRecord {
                index,
                trade_name,
                username: usernames.remove(&index),
                password: passwords.remove(&index).map(SecretString::new),
            })
            .collect())
    }

    /// Inserts or updates one account. A conflict on the normalized trade
    /// name reuses the existing index but only proceeds when the supplied
    /// `confirm` capability answers yes — overwrite policy belongs to the
    /// caller, not the store. The field group is applied in memory and
    /// written in a single file replace.
    pub fn upsert(
        &self,
        update: AccountUpdate,
        confirm: &mut dyn FnMut(&str) -> Result<bool>,
    ) -> Result<UpsertOutcome> {
        let normalized = normalize(&update.trade_name);
        if normalized.is_empty() {
            return Err(GstLoginError::EmptyTradeName);
        }

        let mut lines = self.read_lines()?;

        let mut existing = None;
        for raw in &lines {
            if let Some(entry) = line::parse(raw) {
                if entry.field == Field::TradeName && normalize(&entry.value) == normalized {
                    existing = Some(entry.index);
                }
            }
        }

        let (index, updating) = match existing {
            Some(index) => {
                let question = format!(
                    "Trade Name '{}' already exists with index {}. Overwrite its stored credentials?",
                    update.trade_name, index
                );
                if !confirm(&question)? {
                    return Ok(UpsertOutcome::Aborted);
                }
                (index, true)
            }
            None => (self.next_index()?, false),
        };

        apply(&mut lines, Field::TradeName, index, &update.trade_name);
        if let Some(username) = &update.username {
            apply(&mut lines, Field::Username, index, username);
        }
        if let Some(password) = &update.password {
            apply(&mut lines, Field::Password, index, password);
        }
        self.write_lines(&lines)?;

        debug!(index, updating, "credential store written");
        Ok(if updating {
            UpsertOutcome::Updated(index)
        } else {
            UpsertOutcome::Inserted(index)
        })
    }

    fn scan(&self) -> Result<Vec<line::Entry>> {
        Ok(self
            .read_lines()?
            .iter()
            .filter_map(|raw| line::parse(raw))
            .collect())
    }

    fn read_lines(&self) -> Result<Vec<String>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        Ok(raw.lines().map(str::to_string).collect())
    }

    /// Atomic whole-file replace: write to a temp file, fsync, rename.
    fn write_lines(&self, lines: &[String]) -> Result<()> {
        let mut content = lines.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }

        let mut tmp_name = self.path.file_name().unwrap_or_default().to_owned();
        tmp_name.push(".tmp");
        let tmp = self.path.with_file_name(tmp_name);
        {
            let mut file = std::fs::File::create(&tmp)?;
            write!(file, "{}", content)?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Rewrites the key's line in place if present, else appends.
fn apply(lines: &mut Vec<String>, field: Field, index: u32, value: &str) {
    let rendered = line::format_entry(field, index, value);
    for existing in lines.iter_mut() {
        if let Some(entry) = line::parse(existing) {
            if entry.field == field && entry.index == index {
                *existing = rendered;
                return;
            }
        }
    }
    lines.push(rendered);
}
