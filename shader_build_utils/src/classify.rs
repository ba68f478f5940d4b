/// The two groups of shader sources the packager knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderFamily {
    /// Compiled directly by the platform toolchain into intermediate files
    Native,
    /// Cross-platform sources, waiting on a translation step
    Portable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    Metal,
    GlslVertex,
    GlslFragment,
}

impl ShaderKind {
    pub fn family(self) -> ShaderFamily {
        match self {
            ShaderKind::Metal => ShaderFamily::Native,
            ShaderKind::GlslVertex | ShaderKind::GlslFragment => ShaderFamily::Portable,
        }
    }
}

/// Maps file extensions (including the leading dot) to the kind of shader they contain.
/// The table is built once at startup and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ExtensionTable {
    entries: Vec<(String, ShaderKind)>,
}

impl ExtensionTable {
    pub fn empty() -> Self {
        Self { entries: vec![] }
    }

    pub fn with_extension(mut self, extension: impl Into<String>, kind: ShaderKind) -> Self {
        self.entries.push((extension.into(), kind));
        self
    }

    /// Returns `None` when the file belongs to no known family and should be ignored
    pub fn classify(&self, file_name: &str) -> Option<ShaderKind> {
        self.entries
            .iter()
            .find(|(extension, _)| file_name.ends_with(extension.as_str()))
            .map(|(_, kind)| *kind)
    }

    pub fn extensions_of(&self, family: ShaderFamily) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(move |(_, kind)| kind.family() == family)
            .map(|(extension, _)| extension.as_str())
    }
}

impl Default for ExtensionTable {
    fn default() -> Self {
        Self::empty()
            .with_extension(".metal", ShaderKind::Metal)
            .with_extension(".frag", ShaderKind::GlslFragment)
            .with_extension(".vert", ShaderKind::GlslVertex)
    }
}
