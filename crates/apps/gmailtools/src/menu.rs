//! Interactive follow-up menu shown after `print_emails --await`

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::debug;
use mail::actions::print_messages;
use mail::{
    BodyFormat, FieldRegistry, MailApi, ParsedMessage, PostAction, SearchField, SearchSpec,
    dispatch, fetch_messages,
};

use crate::cli::PromptSearch;

const HEADER: &str = "Select option for retrieved emails:";

const OPTIONS: [&str; 5] = [
    "Download attachments",
    "Store emails",
    "Refine search",
    "New search",
    "Quit",
];

/// A menu selection together with everything needed to carry it out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuChoice {
    Download(PathBuf),
    Store(PathBuf),
    /// Previous search plus new terms, narrowed to the previous results
    Refine(SearchSpec),
    NewSearch(SearchSpec),
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchMode {
    Additional,
    New,
}

impl SearchMode {
    fn prompt(self) -> &'static str {
        match self {
            SearchMode::Additional => "Enter additional search terms: ",
            SearchMode::New => "Enter new search terms: ",
        }
    }
}

/// Menu loop over the results of the last search
pub struct Menu<'a, R, W> {
    api: &'a dyn MailApi,
    format: BodyFormat,
    registry: FieldRegistry,
    input: R,
    output: W,
    spec: SearchSpec,
    messages: Vec<ParsedMessage>,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub fn new(
        api: &'a dyn MailApi,
        spec: SearchSpec,
        messages: Vec<ParsedMessage>,
        input: R,
        output: W,
    ) -> Self {
        Self {
            api,
            format: BodyFormat::default(),
            registry: FieldRegistry::standard(),
            input,
            output,
            spec,
            messages,
        }
    }

    pub fn with_format(mut self, format: BodyFormat) -> Self {
        self.format = format;
        self
    }

    /// Run until Quit is chosen or input ends.
    ///
    /// Bad search input and failed actions are reported and the loop goes on.
    /// Terminal I/O errors end the menu.
    pub fn run(&mut self) -> Result<()> {
        loop {
            let choice = match self.read_choice() {
                Ok(choice) => choice,
                Err(e) if e.is::<io::Error>() => return Err(e),
                Err(e) => {
                    writeln!(self.output, "Error: {:#}", e)?;
                    continue;
                }
            };

            if choice == MenuChoice::Quit {
                return Ok(());
            }
            if let Err(e) = self.apply(choice) {
                writeln!(self.output, "Error: {:#}", e)?;
            }
        }
    }

    /// Show the numbered options until a valid one is picked. `None` on end of input.
    fn show_prompt(&mut self) -> Result<Option<usize>> {
        loop {
            writeln!(self.output, "{}", HEADER)?;
            for (i, option) in OPTIONS.iter().enumerate() {
                writeln!(self.output, "  {}. {}", i + 1, option)?;
            }

            let Some(line) = self.ask("> ")? else {
                return Ok(None);
            };
            match line.parse::<usize>() {
                Ok(n) if (1..=OPTIONS.len()).contains(&n) => return Ok(Some(n - 1)),
                _ => debug!("Invalid menu selection {:?}", line),
            }
        }
    }

    fn read_choice(&mut self) -> Result<MenuChoice> {
        let Some(index) = self.show_prompt()? else {
            return Ok(MenuChoice::Quit);
        };

        let choice = match index {
            0 => self
                .ask("Directory: ")?
                .map(|d| MenuChoice::Download(PathBuf::from(d))),
            1 => self
                .ask("Storage file: ")?
                .map(|f| MenuChoice::Store(PathBuf::from(f))),
            2 => self.ask_search(SearchMode::Additional)?.map(MenuChoice::Refine),
            3 => self.ask_search(SearchMode::New)?.map(MenuChoice::NewSearch),
            _ => Some(MenuChoice::Quit),
        };
        Ok(choice.unwrap_or(MenuChoice::Quit))
    }

    /// Prompt for search flags until at least one search flag is given
    fn ask_search(&mut self, mode: SearchMode) -> Result<Option<SearchSpec>> {
        let line = loop {
            let Some(line) = self.ask(mode.prompt())? else {
                return Ok(None);
            };
            if self.has_search_flag(&line) {
                break line;
            }
            writeln!(self.output, "Flags must be used in search")?;
        };

        let parsed = PromptSearch::try_parse_from(line.split_whitespace())?;
        let terms = parsed.search.to_spec()?;

        Ok(Some(match mode {
            SearchMode::New => terms,
            SearchMode::Additional => {
                let mut spec = self.spec.clone();
                spec.merge(terms);
                spec.push(SearchField::Ids, self.previous_ids());
                spec
            }
        }))
    }

    fn has_search_flag(&self, line: &str) -> bool {
        line.split_whitespace().any(|token| {
            let flag = token.split('=').next().unwrap_or(token);
            self.registry.lookup(flag).is_some()
        })
    }

    /// Message-ID values of the current results; placeholder ids are not searchable
    fn previous_ids(&self) -> Vec<String> {
        self.messages
            .iter()
            .filter(|m| !m.id.starts_with("Unidentified"))
            .map(|m| m.id.clone())
            .collect()
    }

    fn apply(&mut self, choice: MenuChoice) -> Result<()> {
        match choice {
            MenuChoice::Download(dir) => {
                let action = PostAction::Download {
                    dir,
                    force: false,
                    verbose: true,
                };
                dispatch(&self.messages, &action)?;
            }
            MenuChoice::Store(output) => {
                let action = PostAction::Store {
                    output,
                    allow_overwrite: true,
                    verbose: true,
                };
                dispatch(&self.messages, &action)?;
            }
            MenuChoice::Refine(spec) | MenuChoice::NewSearch(spec) => self.search(spec)?,
            MenuChoice::Quit => {}
        }
        Ok(())
    }

    fn search(&mut self, spec: SearchSpec) -> Result<()> {
        let (query, messages) = fetch_messages(self.api, &spec, self.format)?;
        if messages.is_empty() {
            writeln!(self.output, "No messages matched query {}", query)?;
        } else {
            print_messages(&messages);
        }
        self.spec = spec;
        self.messages = messages;
        Ok(())
    }

    /// Print `prompt` and read one trimmed line. `None` on end of input.
    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mail::InMemoryMailApi;
    use mail::gmail::api::{GmailMessage, Header, MessagePart};
    use std::io::{BufReader, Cursor, Read};

    /// Reader whose every read fails
    struct BrokenInput;

    impl Read for BrokenInput {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "terminal closed"))
        }
    }

    fn message(id: &str, message_id: &str) -> GmailMessage {
        GmailMessage {
            id: id.to_string(),
            thread_id: id.to_string(),
            label_ids: None,
            snippet: String::new(),
            payload: Some(MessagePart {
                mime_type: Some("text/plain".to_string()),
                headers: Some(vec![
                    Header::new("From", "alice@example.com"),
                    Header::new("Message-ID", message_id),
                ]),
                ..Default::default()
            }),
        }
    }

    fn api() -> InMemoryMailApi {
        let api = InMemoryMailApi::default();
        api.add_message(message("m1", "<m1@example.com>"));
        api
    }

    fn initial(api: &InMemoryMailApi) -> (SearchSpec, Vec<ParsedMessage>) {
        let spec = SearchSpec::new().with(SearchField::From, ["alice@example.com"]);
        let (_, messages) = fetch_messages(api, &spec, BodyFormat::Plain).unwrap();
        (spec, messages)
    }

    /// Run the menu over `input` and return everything it wrote
    fn run(api: &InMemoryMailApi, input: &str) -> String {
        let (spec, messages) = initial(api);
        let mut output = Vec::new();
        Menu::new(api, spec, messages, Cursor::new(input.to_string()), &mut output)
            .with_format(BodyFormat::Plain)
            .run()
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_quit() {
        let api = api();
        let output = run(&api, "5\n");
        assert_eq!(output.matches(HEADER).count(), 1);
    }

    #[test]
    fn test_end_of_input_quits() {
        let api = api();
        run(&api, "");
    }

    #[test]
    fn test_invalid_selection_reprints_menu() {
        let api = api();
        let output = run(&api, "9\nabc\n0\n5\n");
        assert_eq!(output.matches(HEADER).count(), 4);
    }

    #[test]
    fn test_store_choice_writes_file() {
        let api = api();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("emails.json");

        run(&api, &format!("2\n{}\n5\n", path.display()));

        let stored: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(stored.get("<m1@example.com>").is_some());
    }

    #[test]
    fn test_action_error_keeps_loop_running() {
        let api = api();
        let output = run(&api, "1\n/definitely/not/a/dir\n5\n");
        assert!(output.contains("Error:"));
        assert_eq!(output.matches(HEADER).count(), 2);
    }

    #[test]
    fn test_refine_adds_terms_and_previous_ids() {
        let api = api();
        run(&api, "3\n-s report\n5\n");

        let (query, _) = api.list_calls().last().cloned().unwrap();
        assert_eq!(
            query,
            "from:alice@example.com subject:report {rfc822msgid:<m1@example.com>}"
        );
    }

    #[test]
    fn test_new_search_discards_previous_terms() {
        let api = api();
        let output = run(&api, "4\nhello\n-t bob@example.com\n5\n");

        assert!(output.contains("Flags must be used in search"));
        let (query, _) = api.list_calls().last().cloned().unwrap();
        assert_eq!(query, "to:bob@example.com");
    }

    #[test]
    fn test_search_parse_error_is_reported() {
        let api = api();
        let output = run(&api, "4\n-f a@x.com --bogus\n5\n");
        assert!(output.contains("Error:"));
        assert_eq!(api.list_calls().len(), 1);
    }

    #[test]
    fn test_input_error_ends_menu() {
        let api = api();
        let (spec, messages) = initial(&api);
        let mut output = Vec::new();

        let result = Menu::new(&api, spec, messages, BufReader::new(BrokenInput), &mut output)
            .with_format(BodyFormat::Plain)
            .run();

        let err = result.unwrap_err();
        assert_eq!(
            err.downcast_ref::<io::Error>().map(io::Error::kind),
            Some(io::ErrorKind::BrokenPipe)
        );
        let output = String::from_utf8(output).unwrap();
        assert_eq!(output.matches(HEADER).count(), 1);
        assert!(!output.contains("Error:"));
    }
}
