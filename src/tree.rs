// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Peter Carlton
// Modifications (c) 2026 Peter Carlton

use std::collections::{BTreeSet, HashMap};

use crate::errors::PipelineError;

#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub name: Option<String>,
    pub branch_length: Option<f64>,
    pub children: Vec<TreeNode>,
}

/// An unrooted bipartition of the leaf set, stored as the side without the smallest leaf name.
pub type Split = BTreeSet<String>;

impl TreeNode {
    pub fn leaf(name: &str, branch_length: f64) -> Self {
        TreeNode {
            name: Some(name.to_string()),
            branch_length: Some(branch_length),
            children: Vec::new(),
        }
    }

    pub fn internal(children: Vec<TreeNode>) -> Self {
        TreeNode {
            name: None,
            branch_length: None,
            children,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn leaf_count(&self) -> usize {
        if self.is_leaf() {
            1
        } else {
            self.children.iter().map(TreeNode::leaf_count).sum()
        }
    }

    /// Leaf names, left to right.
    pub fn leaf_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_leaf_names(&mut names);
        names
    }

    fn collect_leaf_names(&self, out: &mut Vec<String>) {
        if self.is_leaf() {
            out.push(self.name.clone().unwrap_or_default());
        } else {
            for child in &self.children {
                child.collect_leaf_names(out);
            }
        }
    }

    /// Sorts the children of every internal node by increasing number of leaves, so that the
    /// drawing reads like a ladder. The sort is stable: equal-sized clades keep their order.
    pub fn ladderize(&mut self) {
        for child in &mut self.children {
            child.ladderize();
        }
        self.children.sort_by_key(TreeNode::leaf_count);
    }

    /// Distance from the root to the deepest leaf, missing lengths counting as zero.
    pub fn depth(&self) -> f64 {
        let own = self.branch_length.unwrap_or(0.0);
        own + self
            .children
            .iter()
            .map(TreeNode::depth)
            .fold(0.0, f64::max)
    }

    /// The non-trivial splits of the tree, ignoring where it is rooted. Two trees with the same
    /// leaves have the same unrooted topology iff their split sets are equal.
    pub fn splits(&self) -> BTreeSet<Split> {
        let all: BTreeSet<String> = self.leaf_names().into_iter().collect();
        let mut result = BTreeSet::new();
        let Some(smallest) = all.iter().next().cloned() else {
            return result;
        };
        let mut stack: Vec<&TreeNode> = self.children.iter().collect();
        while let Some(node) = stack.pop() {
            stack.extend(node.children.iter());
            let side: BTreeSet<String> = node.leaf_names().into_iter().collect();
            if side.len() < 2 || side.len() + 2 > all.len() {
                continue;
            }
            let split = if side.contains(&smallest) {
                all.difference(&side).cloned().collect()
            } else {
                side
            };
            result.insert(split);
        }
        result
    }

    pub fn to_newick(&self) -> String {
        let mut out = String::new();
        self.write_newick(&mut out);
        out.push(';');
        out
    }

    fn write_newick(&self, out: &mut String) {
        if !self.is_leaf() {
            out.push('(');
            for (i, child) in self.children.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                child.write_newick(out);
            }
            out.push(')');
        }
        if let Some(name) = &self.name {
            out.push_str(&quote_label(name));
        }
        if let Some(len) = self.branch_length {
            out.push_str(&format!(":{:.5}", len));
        }
    }
}

fn quote_label(name: &str) -> String {
    if name
        .chars()
        .any(|c| c.is_whitespace() || "()[]',:;".contains(c))
    {
        format!("'{}'", name.replace('\'', "''"))
    } else {
        name.to_string()
    }
}

pub fn parse_newick(input: &str) -> Result<TreeNode, PipelineError> {
    let mut parser = Parser::new(input);
    let node = parser.parse_node()?;
    parser.skip_whitespace();
    if parser.peek() == Some(';') {
        parser.pos += 1;
        parser.skip_whitespace();
    }
    if parser.peek().is_some() {
        return Err(PipelineError::Format(format!(
            "Trailing characters after Newick tree at position {}",
            parser.pos
        )));
    }
    Ok(node)
}

// ASCII drawing, for a quick look in the terminal.

#[derive(Clone, Copy)]
struct NodeInfo {
    depth: usize,
    y: usize,
}

/// Draws the tree with box-drawing characters, one leaf per line, and returns the lines along
/// with the leaf order.
pub fn tree_lines_and_order(root: &TreeNode) -> Result<(Vec<String>, Vec<String>), PipelineError> {
    let root = collapse_unary(root.clone());
    let (node_map, leaves) = assign_rows_and_depths(&root);
    if leaves.is_empty() {
        return Ok((Vec::new(), Vec::new()));
    }
    let order: Vec<String> = leaves.iter().map(|(_, name)| name.clone()).collect();
    if order.iter().any(|name| name.is_empty()) {
        return Err(PipelineError::Format(String::from("Missing leaf name")));
    }
    let mut lines = render_box_tree(&root, &node_map, &leaves);
    for (line, name) in lines.iter_mut().zip(&order) {
        line.push(' ');
        line.push_str(name);
    }
    Ok((lines, order))
}

fn collapse_unary(mut node: TreeNode) -> TreeNode {
    while node.children.len() == 1 {
        let mut child = node.children.remove(0);
        if node.name.is_some() && child.name.is_none() {
            child.name = node.name.take();
        }
        node = child;
    }
    if !node.children.is_empty() {
        node.children = node.children.into_iter().map(collapse_unary).collect();
    }
    node
}

fn assign_rows_and_depths(root: &TreeNode) -> (HashMap<usize, NodeInfo>, Vec<(usize, String)>) {
    let mut node_map = HashMap::new();
    let mut leaves = Vec::new();
    let mut next_y = 0;

    fn walk(
        node: &TreeNode,
        depth: usize,
        next_y: &mut usize,
        node_map: &mut HashMap<usize, NodeInfo>,
        leaves: &mut Vec<(usize, String)>,
    ) -> usize {
        let y = if node.is_leaf() {
            let y = *next_y;
            *next_y += 1;
            leaves.push((y, node.name.clone().unwrap_or_default()));
            y
        } else {
            let ys: Vec<usize> = node
                .children
                .iter()
                .map(|child| walk(child, depth + 1, next_y, node_map, leaves))
                .collect();
            let y_top = ys.iter().copied().min().unwrap_or(0);
            let y_bottom = ys.iter().copied().max().unwrap_or(0);
            (y_top + y_bottom) / 2
        };
        node_map.insert(node as *const _ as usize, NodeInfo { depth, y });
        y
    }

    walk(root, 0, &mut next_y, &mut node_map, &mut leaves);
    (node_map, leaves)
}

fn render_box_tree(
    root: &TreeNode,
    node_map: &HashMap<usize, NodeInfo>,
    leaves: &[(usize, String)],
) -> Vec<String> {
    let n_rows = leaves.len();
    let max_depth = node_map.values().map(|info| info.depth).max().unwrap_or(0);
    let tree_width = max_depth * 2 + 1;
    let mut grid: Vec<Vec<char>> = vec![vec![' '; tree_width]; n_rows];

    fn put(grid: &mut [Vec<char>], y: usize, x: usize, ch: char) {
        if y >= grid.len() || x >= grid[y].len() {
            return;
        }
        let existing = grid[y][x];
        grid[y][x] = match (existing, ch) {
            (' ', c) => c,
            ('│', '─') | ('─', '│') => '┼',
            (e, '─') | (e, '│') => e,
            (_, c) => c,
        };
    }

    fn draw_internal(node: &TreeNode, node_map: &HashMap<usize, NodeInfo>, grid: &mut [Vec<char>]) {
        if node.is_leaf() {
            return;
        }
        let info = node_map[&(node as *const _ as usize)];
        let x_conn = info.depth * 2 + 1;
        let kid_infos: Vec<NodeInfo> = node
            .children
            .iter()
            .map(|kid| node_map[&(kid as *const _ as usize)])
            .collect();
        let y_top = kid_infos.iter().map(|k| k.y).min().unwrap_or(0);
        let y_bottom = kid_infos.iter().map(|k| k.y).max().unwrap_or(0);

        for y in (y_top + 1)..y_bottom {
            put(grid, y, x_conn, '│');
        }
        for (kid, ki) in node.children.iter().zip(kid_infos.iter()) {
            let jch = if ki.y == y_top && ki.y != y_bottom {
                '┌'
            } else if ki.y == y_bottom && ki.y != y_top {
                '└'
            } else {
                '├'
            };
            put(grid, ki.y, x_conn, jch);
            for x in (x_conn + 1)..=(ki.depth * 2) {
                put(grid, ki.y, x, '─');
            }
            draw_internal(kid, node_map, grid);
        }
    }

    draw_internal(root, node_map, &mut grid);

    // Leaves all end at the right edge.
    for (y, _) in leaves {
        let row = &grid[*y];
        let start = row
            .iter()
            .rposition(|&c| c != ' ')
            .map(|l| l + 1)
            .unwrap_or(0);
        for x in start..tree_width {
            put(&mut grid, *y, x, '─');
        }
    }

    // Where a horizontal line runs into a connector, turn it into a T-junction.
    for row in &mut grid {
        for x in 1..row.len() {
            if row[x - 1] == '─' {
                row[x] = match row[x] {
                    '│' => '┤',
                    '┌' => '┬',
                    '└' => '┴',
                    '├' => '┼',
                    other => other,
                };
            }
        }
    }

    grid.into_iter()
        .map(|row| row.into_iter().collect::<String>().trim_end().to_string())
        .collect()
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn error(&self, msg: &str) -> PipelineError {
        PipelineError::Format(format!("Malformed Newick tree ({} at position {})", msg, self.pos))
    }

    // Whitespace and [bracketed comments] are insignificant between tokens.
    fn skip_whitespace(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => self.pos += 1,
                Some('[') => {
                    while let Some(c) = self.peek() {
                        self.pos += 1;
                        if c == ']' {
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn parse_node(&mut self) -> Result<TreeNode, PipelineError> {
        self.skip_whitespace();
        if self.peek() == Some('(') {
            self.pos += 1;
            let mut children = Vec::new();
            loop {
                let child = self.parse_node()?;
                children.push(child);
                self.skip_whitespace();
                match self.peek() {
                    Some(',') => {
                        self.pos += 1;
                    }
                    Some(')') => {
                        self.pos += 1;
                        break;
                    }
                    _ => return Err(self.error("expected ',' or ')'")),
                }
            }
            let name = self.parse_name_opt()?;
            let branch_length = self.parse_branch_length()?;
            Ok(TreeNode {
                name,
                branch_length,
                children,
            })
        } else {
            let name = self
                .parse_name_opt()?
                .ok_or_else(|| self.error("missing leaf name"))?;
            let branch_length = self.parse_branch_length()?;
            Ok(TreeNode {
                name: Some(name),
                branch_length,
                children: Vec::new(),
            })
        }
    }

    fn parse_name_opt(&mut self) -> Result<Option<String>, PipelineError> {
        self.skip_whitespace();
        match self.peek() {
            Some(':' | ',' | ')' | ';') | None => Ok(None),
            Some('\'') => self.parse_quoted().map(Some),
            _ => {
                let name = self.parse_bare(&[':', ',', ')', '(', ';', '[']);
                Ok((!name.is_empty()).then_some(name))
            }
        }
    }

    fn parse_quoted(&mut self) -> Result<String, PipelineError> {
        self.pos += 1;
        let mut name = String::new();
        loop {
            match self.peek() {
                Some('\'') if self.chars.get(self.pos + 1) == Some(&'\'') => {
                    name.push('\'');
                    self.pos += 2;
                }
                Some('\'') => {
                    self.pos += 1;
                    return Ok(name);
                }
                Some(c) => {
                    name.push(c);
                    self.pos += 1;
                }
                None => return Err(self.error("unterminated quoted label")),
            }
        }
    }

    fn parse_bare(&mut self, stops: &[char]) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if stops.contains(&c) || c.is_whitespace() {
                break;
            }
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn parse_branch_length(&mut self) -> Result<Option<f64>, PipelineError> {
        self.skip_whitespace();
        if self.peek() != Some(':') {
            return Ok(None);
        }
        self.pos += 1;
        self.skip_whitespace();
        let text = self.parse_bare(&[',', ')', '(', ';', '[']);
        text.parse::<f64>()
            .map(Some)
            .map_err(|_| self.error(&format!("bad branch length '{}'", text)))
    }
}
