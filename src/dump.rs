use crate::bt::Node;
use std::fmt::{self, Display};

/// Level-by-level rendering of a tree, root on the first line.
/// Each node below the root is followed by a single space.
pub(crate) struct Dump<'a, K, V, const M: usize>(pub(crate) &'a Node<K, V, M>);

impl<K: Display, V, const M: usize> Display for Dump<'_, K, V, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.0)?;
        let mut level: Vec<&Node<K, V, M>> = self.0.c.iter().collect();
        while !level.is_empty() {
            for n in &level {
                write!(f, "{} ", n)?;
            }
            writeln!(f)?;
            level = level.iter().flat_map(|n| n.c.iter()).collect();
        }
        Ok(())
    }
}

/// Keys only, as `[k1,k2]`.
impl<K: Display, V, const M: usize> Display for Node<K, V, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, (k, _)) in self.v.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", k)?;
        }
        f.write_str("]")
    }
}
