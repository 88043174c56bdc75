use std::cell::RefCell;
use std::io::{self, BufRead, BufReader, Write};
use std::rc::Rc;

use astrum_core::{tokenize_from_line, Token, TokenIndex};

use crate::error::Error;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::source::SourceMap;
use crate::value::Value;

const PRELUDE: &str = include_str!("prelude.astr");
const PRELUDE_NAME: &str = "<prelude>";

/// How a [`Session`] is set up. Defaults to the bundled prelude and the process' stdio.
pub struct Config {
    prelude: bool,
    stdout: Option<Rc<RefCell<dyn Write>>>,
    stdin: Option<Rc<RefCell<dyn BufRead>>>,
}

impl Config {
    pub fn new() -> Self {
        Config {
            prelude: true,
            stdout: None,
            stdin: None,
        }
    }

    pub fn prelude(mut self, enabled: bool) -> Self {
        self.prelude = enabled;
        self
    }

    pub fn stdout(mut self, stdout: Rc<RefCell<dyn Write>>) -> Self {
        self.stdout = Some(stdout);
        self
    }

    pub fn stdin(mut self, stdin: Rc<RefCell<dyn BufRead>>) -> Self {
        self.stdin = Some(stdin);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}

/// Runs sources one after another against the same global scope.
pub struct Session {
    interpreter: Interpreter,
    sources: SourceMap,
    // the prelude goes in front of the first source that makes it past the resolver
    prelude_pending: bool,
    // scanned once, without its `Eof`
    prelude: Option<Vec<Token>>,
    next_node: u32,
}

impl Session {
    pub fn new(config: Config) -> Self {
        let stdout = config
            .stdout
            .unwrap_or_else(|| Rc::new(RefCell::new(io::stdout())));
        let stdin = config
            .stdin
            .unwrap_or_else(|| Rc::new(RefCell::new(BufReader::new(io::stdin()))));

        Session {
            interpreter: Interpreter::with_io(stdout, stdin),
            sources: SourceMap::new(),
            prelude_pending: config.prelude,
            prelude: None,
            next_node: 0,
        }
    }

    /// For registering natives before anything runs.
    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }

    pub fn run(&mut self, src: &str) -> Result<Value, Error> {
        self.run_named("<main>", src)
    }

    /// Tokenizes, parses, resolves and runs `src`. Nothing runs if any of the static passes
    /// fail. Returns the value of the last top level expression statement.
    #[tracing::instrument(level = "debug", skip(self, src), fields(len = src.len()))]
    pub fn run_named(&mut self, name: &str, src: &str) -> Result<Value, Error> {
        let mut tokens = if self.prelude_pending {
            self.prelude_tokens()?
        } else {
            Vec::new()
        };

        let first_line = self.sources.add(name, src);
        let offset = tokens.len();
        tokens.extend(
            tokenize_from_line(src, first_line)?
                .into_iter()
                .map(|mut token| {
                    token.idx = TokenIndex(token.idx.0 + offset);
                    token
                }),
        );

        let mut parser = Parser::starting_at(&tokens, self.next_node);
        let program = parser.parse()?;
        self.next_node = parser.next_node_id();

        Resolver::new(&mut self.interpreter).resolve(&program)?;
        self.prelude_pending = false;

        self.interpreter.interpret(&program)
    }

    fn prelude_tokens(&mut self) -> Result<Vec<Token>, Error> {
        if let Some(tokens) = &self.prelude {
            return Ok(tokens.clone());
        }

        let first_line = self.sources.add(PRELUDE_NAME, PRELUDE);
        let mut tokens = tokenize_from_line(PRELUDE, first_line)?;
        tokens.pop();
        self.prelude = Some(tokens.clone());
        Ok(tokens)
    }

    /// Renders an error as `segment:line:col: message`, with the line local to the source
    /// it came from.
    pub fn report(&self, err: &Error) -> String {
        let (segment, line) = self.sources.locate(err.line());
        format!("{}:{}:{}: {}", segment, line, err.col(), err.message())
    }
}
