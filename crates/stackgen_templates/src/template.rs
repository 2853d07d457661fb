//! File templates with variables and appendable sections.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{TemplateError, TemplateResult};
use crate::placeholder::{self, Placeholder};

/// Where the template body comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// Read from disk at render time.
    File(PathBuf),
    /// Template text held in memory.
    Inline(String),
}

impl TemplateSource {
    pub fn inline(text: impl Into<String>) -> Self {
        Self::Inline(text.into())
    }

    /// Load the template body.
    pub fn read(&self) -> TemplateResult<Cow<'_, str>> {
        match self {
            Self::File(path) => fs::read_to_string(path)
                .map(Cow::Owned)
                .map_err(|e| TemplateError::io(path, e)),
            Self::Inline(text) => Ok(Cow::Borrowed(text.as_str())),
        }
    }
}

impl fmt::Display for TemplateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Inline(_) => write!(f, "<inline>"),
        }
    }
}

impl From<PathBuf> for TemplateSource {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

impl From<&Path> for TemplateSource {
    fn from(path: &Path) -> Self {
        Self::File(path.to_path_buf())
    }
}

/// A template bound to one source, accumulating variables and sections
/// until it is rendered.
///
/// `${name}` placeholders must have a variable. `${section:name}`
/// placeholders expand to every block added under `name`, in insertion
/// order, each followed by a newline; sections nobody added expand to
/// nothing.
#[derive(Debug, Clone)]
pub struct FileTemplate {
    source: TemplateSource,
    variables: HashMap<String, String>,
    sections: HashMap<String, Vec<String>>,
}

impl FileTemplate {
    /// Create a template with no variables or sections.
    pub fn new(source: impl Into<TemplateSource>) -> Self {
        Self {
            source: source.into(),
            variables: HashMap::new(),
            sections: HashMap::new(),
        }
    }

    /// Create a template pre-populated with variables.
    pub fn with_variables<K, V>(
        source: impl Into<TemplateSource>,
        variables: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: ToString,
    {
        let mut template = Self::new(source);
        for (name, value) in variables {
            template.add_variable(name, value);
        }
        template
    }

    /// Set a variable. Setting the same name again replaces the value.
    pub fn add_variable(&mut self, name: impl Into<String>, value: impl ToString) -> &mut Self {
        self.variables.insert(name.into(), value.to_string());
        self
    }

    /// Append a block of text to a section.
    pub fn add_section(&mut self, name: impl Into<String>, text: impl AsRef<str>) -> &mut Self {
        let mut block = text.as_ref().to_string();
        block.push('\n');
        self.sections.entry(name.into()).or_default().push(block);
        self
    }

    /// Append the contents of a file to a section.
    pub fn add_section_from_file(
        &mut self,
        name: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> TemplateResult<&mut Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| TemplateError::io(path, e))?;
        debug!("Adding {:?} to section", path);
        Ok(self.add_section(name, text))
    }

    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    /// Accumulated content of a section.
    pub fn section(&self, name: &str) -> Option<String> {
        self.sections.get(name).map(|blocks| blocks.concat())
    }

    /// Distinct placeholder tokens used by the template source, in order
    /// of first appearance.
    pub fn placeholders(&self) -> TemplateResult<Vec<String>> {
        let content = self.source.read()?;
        let mut tokens: Vec<String> = Vec::new();
        for caps in placeholder::pattern().captures_iter(&content) {
            let token = &caps[1];
            if !tokens.iter().any(|t| t == token) {
                tokens.push(token.to_string());
            }
        }
        Ok(tokens)
    }

    /// Render the template source.
    pub fn render(&self) -> TemplateResult<String> {
        let content = self.source.read()?;
        self.render_content(&content)
    }

    /// Render arbitrary template text against this template's variables
    /// and sections.
    pub fn render_content(&self, content: &str) -> TemplateResult<String> {
        let mut rendered = String::with_capacity(content.len());
        let mut last = 0;

        for caps in placeholder::pattern().captures_iter(content) {
            let whole = caps.get(0).expect("capture group 0 is always present");
            rendered.push_str(&content[last..whole.start()]);
            self.resolve(&caps[1], &mut rendered)?;
            last = whole.end();
        }

        rendered.push_str(&content[last..]);
        Ok(rendered)
    }

    fn resolve(&self, token: &str, out: &mut String) -> TemplateResult<()> {
        // A variable set under the full token wins over any section lookup.
        if let Some(value) = self.variables.get(token) {
            out.push_str(value);
            return Ok(());
        }

        match Placeholder::parse(token) {
            Placeholder::Variable(name) => {
                let value = self
                    .variables
                    .get(name)
                    .ok_or_else(|| TemplateError::UnresolvedPlaceholder(name.to_string()))?;
                out.push_str(value);
            }
            reference => {
                if let Some(blocks) = reference.section_name().and_then(|n| self.sections.get(n)) {
                    blocks.iter().for_each(|block| out.push_str(block));
                }
            }
        }
        Ok(())
    }

    /// Render and write the result to `path`, replacing any existing file.
    pub fn render_to_file(self, path: impl AsRef<Path>) -> TemplateResult<()> {
        let path = path.as_ref();
        let rendered = self.render()?;
        write_file(path, &rendered)?;
        debug!("Rendered {} to {:?}", self.source, path);
        Ok(())
    }

    /// Render a one-off template without keeping it around.
    pub fn render_static<K, V>(
        source: impl Into<TemplateSource>,
        variables: impl IntoIterator<Item = (K, V)>,
    ) -> TemplateResult<String>
    where
        K: Into<String>,
        V: ToString,
    {
        Self::with_variables(source, variables).render()
    }

    /// Replace every literal occurrence of `search` in the file at `path`.
    ///
    /// Returns the number of occurrences replaced. The file is rewritten
    /// even when nothing matched.
    pub fn replace_in_file(
        path: impl AsRef<Path>,
        search: &str,
        replace: &str,
    ) -> TemplateResult<usize> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| TemplateError::io(path, e))?;
        let count = content.matches(search).count();
        write_file(path, &content.replace(search, replace))?;
        Ok(count)
    }
}

fn write_file(path: &Path, content: &str) -> TemplateResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| TemplateError::io(parent, e))?;
    }
    fs::write(path, content).map_err(|e| TemplateError::io(path, e))
}
