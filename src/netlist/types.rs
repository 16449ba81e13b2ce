//! Core netlist types: nets and pads.

use std::fmt;
use std::rc::Rc;

#[derive(Debug)]
struct Node {
    num: u32,
    label: String,
}

/// An electrical net.
///
/// Nets compare by identity: two nets with the same label are still
/// different nets unless one is a clone of the other.
#[derive(Debug, Clone)]
pub struct Net {
    node: Rc<Node>,
}

impl Net {
    /// Create a new net.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            node: Rc::new(Node {
                num: 0,
                label: label.into(),
            }),
        }
    }

    /// The net's label.
    pub fn label(&self) -> &str {
        &self.node.label
    }
}

impl PartialEq for Net {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }
}

impl Eq for Net {}

impl fmt::Display for Net {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.node.label)
    }
}

/// A numbered connection point on a component.
#[derive(Debug, Clone)]
pub struct Pad {
    node: Rc<Node>,
    /// Name of the owning component, once attached
    component: Option<Rc<str>>,
}

impl Pad {
    /// Create a new pad.
    pub fn new(num: u32, label: impl Into<String>) -> Self {
        Self {
            node: Rc::new(Node {
                num,
                label: label.into(),
            }),
            component: None,
        }
    }

    /// Pad number within its component.
    pub fn num(&self) -> u32 {
        self.node.num
    }

    /// The pad's label.
    pub fn label(&self) -> &str {
        &self.node.label
    }

    /// Name of the component the pad belongs to.
    pub fn component(&self) -> Option<&str> {
        self.component.as_deref()
    }

    pub(crate) fn attach(&mut self, component: Rc<str>) {
        self.component = Some(component);
    }
}

impl PartialEq for Pad {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }
}

impl Eq for Pad {}

impl fmt::Display for Pad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.node.label, self.node.num)
    }
}
