/// Rewrite rule selected by a builder call's method name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Concatenate arguments into one expression
    Render,
    /// Like `Render`, but echoed
    Out,
    /// Emit the argument verbatim
    Raw,
    /// Runtime conditional yielding fragments
    If,
    /// Runtime loop yielding fragments
    Foreach,
    /// Grouping construct
    With,
    /// Any other name is an HTML element
    Element,
}

impl Directive {
    pub fn classify(name: &str) -> Self {
        match name {
            "render" => Directive::Render,
            "out" => Directive::Out,
            "raw" => Directive::Raw,
            "if" => Directive::If,
            "foreach" => Directive::Foreach,
            "with" => Directive::With,
            _ => Directive::Element,
        }
    }
}
