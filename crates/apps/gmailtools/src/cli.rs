//! Command-line grammar
//!
//! Search flags map one-to-one onto [`SearchField`]; the short and long
//! names here must agree with [`SearchField::aliases`].

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use mail::config::{CREDENTIALS_PATH_VAR, TOKEN_PATH_VAR};
use mail::{AuthConfig, Combinator, SearchField, SearchSpec};

#[derive(Parser, Debug)]
#[command(
    name = "gmailtools",
    version,
    about = "Query, label and archive Gmail from the command line"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub auth: AuthArgs,

    /// Verbose logging (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Label all mail from a list of addresses stored in a JSON file
    AssignLabel {
        /// Label to assign
        name: String,
        /// JSON file holding the addresses
        file: PathBuf,
        /// Keys leading to the address list inside the JSON document
        #[arg(short = 'j', long = "json-keys", num_args = 1.., value_name = "KEY")]
        keys: Vec<String>,
        /// Replace the label if it already exists
        #[arg(long)]
        force: bool,
    },
    /// Mark every unread inbox message as read
    MarkRead,
    /// List the filters configured on the account
    Filters,
    /// Search for messages and act on the results
    Query {
        #[command(subcommand)]
        action: QueryAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum QueryAction {
    /// Print the retrieved messages
    #[command(name = "print_emails", visible_aliases = ["print", "p"])]
    PrintEmails {
        /// Offer follow-up actions after printing
        #[arg(long = "await")]
        await_menu: bool,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Save the retrieved messages as JSON
    #[command(name = "store_emails", visible_aliases = ["store", "s"])]
    StoreEmails {
        /// Output file
        #[arg(short = 'o', long = "output", value_name = "FILE")]
        output: PathBuf,
        /// Report where the messages were saved
        #[arg(short = 'v', long = "verbose")]
        verbose: bool,
        /// Refuse to replace an existing output file
        #[arg(long)]
        no_overwrite: bool,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Save the attachments of the retrieved messages
    #[command(name = "download_attachments", visible_aliases = ["download", "d"])]
    DownloadAttachments {
        /// Target directory
        #[arg(short = 'd', long = "dir", value_name = "DIR", default_value = ".")]
        dir: PathBuf,
        /// List the files written
        #[arg(short = 'v', long = "verbose")]
        verbose: bool,
        /// Replace files that already exist
        #[arg(long)]
        force: bool,
        #[command(flatten)]
        search: SearchArgs,
    },
}

impl QueryAction {
    pub fn search(&self) -> &SearchArgs {
        match self {
            QueryAction::PrintEmails { search, .. }
            | QueryAction::StoreEmails { search, .. }
            | QueryAction::DownloadAttachments { search, .. } => search,
        }
    }
}

/// OAuth file locations, overridable from the environment
#[derive(Args, Debug, Clone, Default)]
pub struct AuthArgs {
    /// Cached OAuth token file
    #[arg(long, global = true, env = TOKEN_PATH_VAR, value_name = "PATH")]
    pub token_path: Option<String>,

    /// OAuth client credentials file
    #[arg(long, global = true, env = CREDENTIALS_PATH_VAR, value_name = "PATH")]
    pub credentials_path: Option<String>,

    /// Save the token after the first successful login
    #[arg(long, global = true)]
    pub write_token: bool,
}

impl AuthArgs {
    pub fn to_config(&self) -> AuthConfig {
        let mut auth = AuthConfig::from_env().write_token(self.write_token);
        if let Some(path) = &self.token_path {
            auth = auth.with_token_path(config::normalize_path(path));
        }
        if let Some(path) = &self.credentials_path {
            auth = auth.with_credentials_path(config::normalize_path(path));
        }
        auth
    }
}

/// Search flags shared by every query action and the interactive prompt
#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Senders to search for
    #[arg(short = 'f', long = "from", num_args = 1.., value_name = "ADDRESS")]
    pub from: Vec<String>,

    /// Recipients to search for
    #[arg(short = 't', long = "to", num_args = 1.., value_name = "ADDRESS")]
    pub to: Vec<String>,

    /// Words or phrases in the message
    #[arg(short = 'w', long = "words", visible_alias = "word", num_args = 1..)]
    pub words: Vec<String>,

    /// Labels
    #[arg(short = 'l', long = "label", num_args = 1..)]
    pub label: Vec<String>,

    /// Categories (primary, social, promotions, ...)
    #[arg(short = 'c', long = "category", num_args = 1..)]
    pub category: Vec<String>,

    /// Words in the subject line
    #[arg(short = 's', long = "subject", num_args = 1..)]
    pub subject: Vec<String>,

    /// Attachment file name or extension
    #[arg(long = "filename", num_args = 1..)]
    pub filename: Vec<String>,

    /// Message-ID header values
    #[arg(short = 'i', long = "ids", num_args = 1..)]
    pub ids: Vec<String>,

    /// Sent before this date (YYYY/MM/DD or MM/DD/YYYY)
    #[arg(short = 'b', long = "before", value_name = "DATE")]
    pub before: Option<String>,

    /// Sent after this date (YYYY/MM/DD or MM/DD/YYYY)
    #[arg(short = 'a', long = "after", value_name = "DATE")]
    pub after: Option<String>,

    /// Raw query text appended as is
    #[arg(short = 'e', long = "extra", num_args = 1..)]
    pub extra: Vec<String>,

    /// Maximum number of messages to retrieve (1-500)
    #[arg(
        short = 'm',
        long = "max-emails",
        visible_alias = "max_emails",
        default_value_t = SearchSpec::MAX_RESULTS
    )]
    pub max_emails: usize,

    /// Join terms with OR instead of AND
    #[arg(short = 'O', long = "or")]
    pub or: bool,
}

impl SearchArgs {
    fn terms(&self) -> [(SearchField, &[String]); 11] {
        [
            (SearchField::From, self.from.as_slice()),
            (SearchField::To, self.to.as_slice()),
            (SearchField::Words, self.words.as_slice()),
            (SearchField::Label, self.label.as_slice()),
            (SearchField::Category, self.category.as_slice()),
            (SearchField::Subject, self.subject.as_slice()),
            (SearchField::Filename, self.filename.as_slice()),
            (SearchField::Ids, self.ids.as_slice()),
            (SearchField::Before, self.before.as_slice()),
            (SearchField::After, self.after.as_slice()),
            (SearchField::Extra, self.extra.as_slice()),
        ]
    }

    /// Build the search, checking the result cap. Fields left empty are skipped.
    pub fn to_spec(&self) -> mail::Result<SearchSpec> {
        let mode = if self.or {
            Combinator::Or
        } else {
            Combinator::And
        };
        let mut spec = SearchSpec::new()
            .with_mode(mode)
            .with_max_results(self.max_emails)?;
        for (field, values) in self.terms() {
            spec.push(field, values.iter().cloned());
        }
        Ok(spec)
    }
}

/// Search flags typed at the interactive prompt
#[derive(Parser, Debug)]
#[command(name = "search", no_binary_name = true)]
pub struct PromptSearch {
    #[command(flatten)]
    pub search: SearchArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("gmailtools").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
        PromptSearch::command().debug_assert();
    }

    #[test]
    fn test_every_field_alias_is_a_flag() {
        for field in SearchField::ALL {
            for alias in field.aliases() {
                let parsed = PromptSearch::try_parse_from([*alias, "2020/01/01"])
                    .unwrap_or_else(|e| panic!("{} rejected: {}", alias, e));
                let spec = parsed.search.to_spec().unwrap();
                assert_eq!(
                    spec.values(field),
                    Some(&["2020/01/01".to_string()][..]),
                    "{} did not fill {}",
                    alias,
                    field
                );
            }
        }
    }

    #[test]
    fn test_query_print_aliases() {
        for name in ["print_emails", "print", "p"] {
            let cli = parse(&["query", name, "-f", "a@x.com", "b@x.com", "--await"]);
            let Commands::Query {
                action: QueryAction::PrintEmails { await_menu, search },
            } = cli.command
            else {
                panic!("expected print_emails");
            };
            assert!(await_menu);
            assert_eq!(search.from, vec!["a@x.com", "b@x.com"]);
        }
    }

    #[test]
    fn test_store_and_download_flags() {
        let cli = parse(&["query", "s", "-o", "out.json", "--no-overwrite", "-l", "work"]);
        let Commands::Query { action } = cli.command else {
            panic!("expected query");
        };
        assert!(matches!(
            &action,
            QueryAction::StoreEmails { output, no_overwrite: true, verbose: false, .. }
                if output == &PathBuf::from("out.json")
        ));
        assert_eq!(action.search().label, vec!["work"]);

        let cli = parse(&["query", "d", "-d", "/tmp", "--force", "--filename", "pdf"]);
        let Commands::Query { action } = cli.command else {
            panic!("expected query");
        };
        assert!(matches!(action, QueryAction::DownloadAttachments { force: true, .. }));
    }

    #[test]
    fn test_to_spec_mode_and_cap() {
        let cli = parse(&["query", "p", "-f", "a@x.com", "-s", "hi", "-O", "-m", "25"]);
        let Commands::Query { action } = cli.command else {
            panic!("expected query");
        };
        let spec = action.search().to_spec().unwrap();
        assert_eq!(spec.max_results(), 25);
        assert_eq!(spec.to_query().unwrap(), "{from:a@x.com OR subject:hi}");
    }

    #[test]
    fn test_max_emails_out_of_range() {
        let cli = parse(&["query", "p", "-f", "a@x.com", "-m", "501"]);
        let Commands::Query { action } = cli.command else {
            panic!("expected query");
        };
        assert!(matches!(
            action.search().to_spec(),
            Err(mail::MailError::InvalidMaxResults(501))
        ));
    }

    #[test]
    fn test_assign_label_keys() {
        let cli = parse(&["assign-label", "Students", "list.json", "-j", "a", "b", "--force"]);
        let Commands::AssignLabel { name, keys, force, .. } = cli.command else {
            panic!("expected assign-label");
        };
        assert_eq!(name, "Students");
        assert_eq!(keys, vec!["a", "b"]);
        assert!(force);
    }

    #[test]
    fn test_auth_flags_override_paths() {
        let cli = parse(&[
            "mark-read",
            "--token-path",
            "/tmp/t.json",
            "--credentials-path",
            "/tmp/c.json",
            "--write-token",
        ]);
        let auth = cli.auth.to_config();
        assert_eq!(auth.token_path, PathBuf::from("/tmp/t.json"));
        assert_eq!(auth.credentials_path, PathBuf::from("/tmp/c.json"));
        assert!(auth.write_token);
    }
}
