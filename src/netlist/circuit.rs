//! Components, connections and circuits.

use std::fmt;
use std::rc::Rc;

use tracing::debug;

use super::types::{Net, Pad};
use crate::dsn::DeclTree;
use crate::error::{DsnError, Result};

/// Anything exposing numbered pads.
pub trait Component {
    /// The component's reference designator.
    fn name(&self) -> &str;

    /// All pads, sorted by number.
    fn pads(&self) -> &[Pad];

    /// Look up a pad by number.
    fn pad(&self, num: u32) -> Option<&Pad> {
        self.pads().iter().find(|p| p.num() == num)
    }
}

/// A component that is nothing but a name and its pads.
#[derive(Debug, Clone, Default)]
pub struct BaseComponent {
    name: String,
    pads: Vec<Pad>,
}

impl BaseComponent {
    /// Create a component with no pads.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pads: Vec::new(),
        }
    }

    /// Replace the component's pads.
    ///
    /// Pad numbers must be strictly increasing.
    pub fn set_pads(&mut self, mut pads: Vec<Pad>) -> Result<()> {
        for pair in pads.windows(2) {
            if pair[0].num() >= pair[1].num() {
                return Err(DsnError::invalid_pads(
                    &self.name,
                    format!(
                        "pad {} follows pad {}; pads must be sorted by number and unique",
                        pair[1].num(),
                        pair[0].num()
                    ),
                ));
            }
        }
        let owner: Rc<str> = Rc::from(self.name.as_str());
        for pad in &mut pads {
            pad.attach(Rc::clone(&owner));
        }
        self.pads = pads;
        Ok(())
    }
}

impl Component for BaseComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn pads(&self) -> &[Pad] {
        &self.pads
    }
}

/// A set of pads tied together, optionally on a named net.
#[derive(Debug, Clone)]
pub struct Connection {
    net: Option<Net>,
    pads: Vec<Pad>,
}

impl Connection {
    /// Tie `pads` together on `net`.
    pub fn join(net: Net, pads: Vec<Pad>) -> Self {
        Self {
            net: Some(net),
            pads,
        }
    }

    /// Tie `pads` together without naming the net.
    pub fn join_pads(pads: Vec<Pad>) -> Self {
        Self { net: None, pads }
    }

    /// The net, if the connection has one.
    pub fn net(&self) -> Option<&Net> {
        self.net.as_ref()
    }

    /// Connected pads.
    pub fn pads(&self) -> &[Pad] {
        &self.pads
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        if let Some(net) = self.net.as_ref().filter(|n| !n.label().is_empty()) {
            write!(f, "{} ", net)?;
        }
        for (i, pad) in self.pads.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", pad)?;
        }
        f.write_str(")")
    }
}

/// A circuit as a list of connections.
#[derive(Debug, Clone, Default)]
pub struct Circuit {
    connections: Vec<Connection>,
}

impl Circuit {
    /// Create an empty circuit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append connections.
    pub fn add_connections(&mut self, connections: impl IntoIterator<Item = Connection>) {
        self.connections.extend(connections);
    }

    /// All connections in insertion order.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Build a circuit from the `network` section of a parsed DSN file.
    ///
    /// Each `(net NAME (pins REF-PAD ...))` becomes one connection whose pads
    /// are labelled with the component reference, so `U1-4` renders as
    /// `U1:4`. A tree without a `network` section gives an empty circuit.
    pub fn from_network(tree: &DeclTree) -> Result<Self> {
        let mut circuit = Circuit::new();
        let Some(network) = tree.find("network") else {
            return Ok(circuit);
        };

        for net_decl in network.children().filter(|d| d.name() == "net") {
            let label = net_decl.first_arg().map(|a| a.unquoted()).unwrap_or_default();
            let mut pads = Vec::new();
            for pins in net_decl.children().filter(|d| d.name() == "pins") {
                for pin in pins.args() {
                    pads.push(parse_pin(pin.unquoted())?);
                }
            }
            debug!(net = label, pads = pads.len(), "net loaded");
            circuit.add_connections([Connection::join(Net::new(label), pads)]);
        }
        Ok(circuit)
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, conn) in self.connections.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", conn)?;
        }
        Ok(())
    }
}

/// Split a `REF-PAD` pin reference such as `U1-4` or `R-12-2`.
fn parse_pin(pin: &str) -> Result<Pad> {
    let malformed = || DsnError::UnknownPin {
        pin: pin.to_string(),
    };
    let (reference, num) = pin.rsplit_once('-').ok_or_else(malformed)?;
    if reference.is_empty() {
        return Err(malformed());
    }
    let num = num.parse().map_err(|_| malformed())?;
    let mut pad = Pad::new(num, reference);
    pad.attach(Rc::from(reference));
    Ok(pad)
}
