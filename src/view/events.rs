//! User actions, parsed from CLI flags or interactive commands

use std::str::FromStr;

use crate::errors::AppError;
use crate::models::SortField;

use super::pagination::PageAction;

/// One discrete user action; handled to completion before the next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// `None` selects all categories
    CategoryChanged(Option<String>),
    InstructorQuery(String),
    NameQuery(String),
    HeaderClicked(SortField),
    Page(PageAction),
    Reset,
    Export,
    Stats,
    Quit,
}

impl UiEvent {
    /// Whether the event changes what the table shows
    pub fn affects_view(&self) -> bool {
        !matches!(self, Self::Export | Self::Stats | Self::Quit)
    }
}

/// Command grammar help shown by the interactive loop
pub const COMMAND_HELP: &str = "\
commands:
  category <name>|all     filter by category
  instructor <text>       filter by instructor (substring)
  name <text>             filter by course name (substring)
  sort <field>            sort by column; repeat to flip direction
  page <n>|next|prev|first|last
  reset                   clear filters and sorting
  export                  write the filtered courses to CSV
  stats                   print the summary counters
  quit";

impl FromStr for UiEvent {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim();
        let (command, argument) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command.to_lowercase().as_str() {
            "category" | "cat" => Ok(Self::CategoryChanged(
                match argument {
                    "" | "all" | "*" => None,
                    category => Some(category.to_string()),
                },
            )),
            "instructor" | "teacher" => Ok(Self::InstructorQuery(argument.to_string())),
            "name" | "search" => Ok(Self::NameQuery(argument.to_string())),
            "sort" => {
                if argument.is_empty() {
                    return Err(AppError::validation("sort needs a field"));
                }
                argument
                    .parse()
                    .map(Self::HeaderClicked)
                    .map_err(AppError::validation)
            }
            "page" | "p" => {
                if argument.is_empty() {
                    return Err(AppError::validation(
                        "page needs a number or next|prev|first|last",
                    ));
                }
                argument.parse().map(Self::Page).map_err(AppError::validation)
            }
            "next" | "n" => Ok(Self::Page(PageAction::Next)),
            "prev" => Ok(Self::Page(PageAction::Previous)),
            "reset" => Ok(Self::Reset),
            "export" => Ok(Self::Export),
            "stats" => Ok(Self::Stats),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            "" => Err(AppError::validation("empty command")),
            other => Err(AppError::validation(format!("Unknown command: '{}'", other))),
        }
    }
}
