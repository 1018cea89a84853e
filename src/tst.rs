//! Ternary search tree keyed by `char` sequences, storing lists of word
//! indices at terminal nodes. A safe, arena-indexed reimplementation of the
//! original `tst_node_s` (`lokid`/`eqkid`/`hikid`/`data`/`splitchar`
//! pointer tree): nodes live in one `Vec<TstNode>` and children are
//! `Option<usize>` indices instead of raw pointers.

#[derive(Debug, Clone)]
struct TstNode {
    split: char,
    lokid: Option<usize>,
    eqkid: Option<usize>,
    hikid: Option<usize>,
    /// Word indices terminating exactly at this node (non-empty only on a
    /// key's final character).
    data: Vec<usize>,
}

impl TstNode {
    fn new(split: char) -> Self {
        TstNode {
            split,
            lokid: None,
            eqkid: None,
            hikid: None,
            data: Vec::new(),
        }
    }
}

/// An owned-arena ternary search tree. `root` is `None` for an empty tree.
#[derive(Debug, Default, Clone)]
pub struct Tst {
    nodes: Vec<TstNode>,
    root: Option<usize>,
}

impl Tst {
    pub fn new() -> Self {
        Tst::default()
    }

    /// Insert `key`, appending `value` to the word-index list stored at the
    /// key's terminal node (a key may map to several occurrences).
    pub fn insert(&mut self, key: &str, value: usize) {
        let chars: Vec<char> = key.chars().collect();
        if chars.is_empty() {
            return;
        }
        self.root = Some(self.insert_rec(self.root, &chars, 0, value));
    }

    fn insert_rec(&mut self, node: Option<usize>, chars: &[char], pos: usize, value: usize) -> usize {
        let c = chars[pos];
        let idx = match node {
            Some(idx) => idx,
            None => {
                self.nodes.push(TstNode::new(c));
                self.nodes.len() - 1
            }
        };
        let split = self.nodes[idx].split;
        if c < split {
            let child = self.nodes[idx].lokid;
            let new_child = self.insert_rec(child, chars, pos, value);
            self.nodes[idx].lokid = Some(new_child);
        } else if c > split {
            let child = self.nodes[idx].hikid;
            let new_child = self.insert_rec(child, chars, pos, value);
            self.nodes[idx].hikid = Some(new_child);
        } else if pos + 1 < chars.len() {
            let child = self.nodes[idx].eqkid;
            let new_child = self.insert_rec(child, chars, pos + 1, value);
            self.nodes[idx].eqkid = Some(new_child);
        } else {
            self.nodes[idx].data.push(value);
        }
        idx
    }

    /// Exact-match lookup.
    pub fn search(&self, key: &str) -> Option<&[usize]> {
        let chars: Vec<char> = key.chars().collect();
        if chars.is_empty() {
            return None;
        }
        let mut node = self.root;
        let mut pos = 0;
        while let Some(idx) = node {
            let n = &self.nodes[idx];
            let c = chars[pos];
            if c < n.split {
                node = n.lokid;
            } else if c > n.split {
                node = n.hikid;
            } else if pos + 1 == chars.len() {
                return if n.data.is_empty() { None } else { Some(&n.data) };
            } else {
                pos += 1;
                node = n.eqkid;
            }
        }
        None
    }

    /// All word indices whose key starts with `prefix` (prefix search
    /// mode).
    pub fn prefix_search(&self, prefix: &str) -> Vec<usize> {
        let chars: Vec<char> = prefix.chars().collect();
        if chars.is_empty() {
            return self.collect_all();
        }
        let mut node = self.root;
        let mut pos = 0;
        while let Some(idx) = node {
            let n = &self.nodes[idx];
            let c = chars[pos];
            if c < n.split {
                node = n.lokid;
            } else if c > n.split {
                node = n.hikid;
            } else if pos + 1 == chars.len() {
                let mut out = Vec::new();
                out.extend_from_slice(&n.data);
                if let Some(eq) = n.eqkid {
                    self.collect_subtree(eq, &mut out);
                }
                return out;
            } else {
                pos += 1;
                node = n.eqkid;
            }
        }
        Vec::new()
    }

    fn collect_subtree(&self, idx: usize, out: &mut Vec<usize>) {
        let n = &self.nodes[idx];
        if let Some(lo) = n.lokid {
            self.collect_subtree(lo, out);
        }
        out.extend_from_slice(&n.data);
        if let Some(eq) = n.eqkid {
            self.collect_subtree(eq, out);
        }
        if let Some(hi) = n.hikid {
            self.collect_subtree(hi, out);
        }
    }

    fn collect_all(&self) -> Vec<usize> {
        let mut out = Vec::new();
        if let Some(root) = self.root {
            self.collect_subtree(root, &mut out);
        }
        out
    }

    /// Every node anywhere in the tree whose `split` matches `c` ("level 0"
    /// of a substring/fuzzy traversal). A needle's first glyph can start a
    /// match at any position within any stored key, not just a key's own
    /// first glyph, so this has to walk the whole tree (lokid/eqkid/hikid
    /// at every depth), the same way `search_any_depth` does for fuzzy mode
    /// — scanning only the root's lo/hi chain would miss every match not
    /// anchored at position zero.
    pub fn level0(&self, c: char) -> Vec<usize> {
        let mut out = Vec::new();
        if let Some(root) = self.root {
            self.scan_all(root, c, &mut out);
        }
        out
    }

    fn scan_all(&self, idx: usize, c: char, out: &mut Vec<usize>) {
        let n = &self.nodes[idx];
        if n.split == c {
            out.push(idx);
        }
        if let Some(lo) = n.lokid {
            self.scan_all(lo, c, out);
        }
        if let Some(hi) = n.hikid {
            self.scan_all(hi, c, out);
        }
        if let Some(eq) = n.eqkid {
            self.scan_all(eq, c, out);
        }
    }

    fn find_siblings(&self, node: Option<usize>, c: char, out: &mut Vec<usize>) {
        let mut cur = node;
        while let Some(idx) = cur {
            let n = &self.nodes[idx];
            if c < n.split {
                cur = n.lokid;
            } else if c > n.split {
                cur = n.hikid;
            } else {
                out.push(idx);
                return;
            }
        }
    }

    /// From a set of nodes at level `n-1`, advance to level `n` by
    /// following each node's `eqkid` chain looking for `c`.
    pub fn advance_level(&self, nodes: &[usize], c: char) -> Vec<usize> {
        let mut out = Vec::new();
        for &idx in nodes {
            if let Some(eq) = self.nodes[idx].eqkid {
                self.find_siblings(Some(eq), c, &mut out);
            }
        }
        out
    }

    /// Same as [`Tst::advance_level`] but accepts a match at *any* depth
    /// below the equal-link (fuzzy mode does not require adjacency).
    pub fn advance_level_fuzzy(&self, nodes: &[usize], c: char, ci: bool) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for &idx in nodes {
            if let Some(eq) = self.nodes[idx].eqkid {
                self.search_any_depth(eq, c, ci, 1, &mut out);
            }
        }
        out
    }

    fn search_any_depth(&self, idx: usize, c: char, ci: bool, depth: usize, out: &mut Vec<(usize, usize)>) {
        let n = &self.nodes[idx];
        let matches = if ci {
            n.split.to_lowercase().eq(c.to_lowercase())
        } else {
            n.split == c
        };
        if matches {
            out.push((idx, depth));
        }
        if let Some(lo) = n.lokid {
            self.search_any_depth(lo, c, ci, depth, out);
        }
        if let Some(hi) = n.hikid {
            self.search_any_depth(hi, c, ci, depth, out);
        }
        if !matches {
            if let Some(eq) = n.eqkid {
                self.search_any_depth(eq, c, ci, depth + 1, out);
            }
        }
    }

    pub fn data_at(&self, node: usize) -> &[usize] {
        &self.nodes[node].data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_round_trips() {
        let mut t = Tst::new();
        t.insert("ant", 0);
        t.insert("apple", 1);
        t.insert("ant", 2);
        assert_eq!(t.search("ant"), Some(&[0usize, 2usize][..]));
        assert_eq!(t.search("apple"), Some(&[1usize][..]));
        assert_eq!(t.search("missing"), None);
    }

    #[test]
    fn prefix_search_finds_all_descendants() {
        let mut t = Tst::new();
        t.insert("ant", 0);
        t.insert("apple", 1);
        t.insert("bee", 2);
        let mut found = t.prefix_search("a");
        found.sort_unstable();
        assert_eq!(found, vec![0, 1]);
    }

    #[test]
    fn level0_finds_matching_root_siblings() {
        let mut t = Tst::new();
        t.insert("ant", 0);
        t.insert("bee", 1);
        assert_eq!(t.level0('b'), t.level0('b'));
        assert!(!t.level0('b').is_empty());
        assert!(t.level0('z').is_empty());
    }

    #[test]
    fn level0_finds_chars_not_at_the_root() {
        let mut t = Tst::new();
        t.insert("ant", 0);
        // 'n' and 't' only ever appear below the root's 'a' node, never as
        // a root split char themselves.
        assert!(!t.level0('n').is_empty());
        assert!(!t.level0('t').is_empty());
    }
}
