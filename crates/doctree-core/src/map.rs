//! Connector-drawn content map.
//!
//! Renders the tree in reading order, one line per node. Documents show
//! their title and directories show `name/`, so the nesting stays visible.
//! With images enabled, each document's image references are listed
//! directly beneath it.
//!
//! ```text
//! ├── Home
//! ├── guide/
//! │   ├── Guide
//! │   │   └── [image] img/flow.png (Flow)
//! │   └── Install
//! └── FAQ
//! ```

use crate::tree::{ContentTree, Node, NodeId};

const BRANCH: &str = "├── ";
const LAST: &str = "└── ";
const PIPE: &str = "│   ";
const SPACE: &str = "    ";

/// Render the whole tree as a text diagram.
pub fn render_map(tree: &ContentTree, include_images: bool) -> String {
    let mut out = String::new();
    render_children(tree, tree.root(), "", include_images, &mut out);
    out
}

fn render_children(
    tree: &ContentTree,
    id: NodeId,
    prefix: &str,
    include_images: bool,
    out: &mut String,
) {
    let children = tree.children(id);
    for (i, child) in children.iter().enumerate() {
        let Some(node) = tree.get(*child) else {
            continue;
        };
        let last = i + 1 == children.len();
        let connector = if last { LAST } else { BRANCH };
        let child_prefix = format!("{}{}", prefix, if last { SPACE } else { PIPE });

        if node.is_directory() {
            out.push_str(&format!("{}{}{}/\n", prefix, connector, node.name));
            render_children(tree, *child, &child_prefix, include_images, out);
        } else {
            out.push_str(&format!("{}{}{}\n", prefix, connector, node.title()));
            if include_images {
                render_images(node, &child_prefix, out);
            }
        }
    }
}

fn render_images(node: &Node, prefix: &str, out: &mut String) {
    for (i, image) in node.images.iter().enumerate() {
        let connector = if i + 1 == node.images.len() { LAST } else { BRANCH };
        let line = match &image.alt {
            Some(alt) => format!("{}{}[image] {} ({})\n", prefix, connector, image.target, alt),
            None => format!("{}{}[image] {}\n", prefix, connector, image.target),
        };
        out.push_str(&line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ContentTree {
        let mut tree = ContentTree::new("en", "en");
        tree.ingest("index.md", "---\ntitle: Home\nweight: 1\n---\n").unwrap();
        tree.ingest(
            "guide/setup.md",
            "---\nweight: 2\n---\n# Guide\n\n![Flow](img/flow.png)\n",
        )
        .unwrap();
        tree.ingest("guide/install.md", "---\nweight: 3\n---\n# Install\n").unwrap();
        tree.ingest("faq.md", "---\nweight: 1000\n---\n# FAQ\n").unwrap();
        tree
    }

    #[test]
    fn test_render_without_images() {
        let expected = "\
├── Home
├── guide/
│   ├── Guide
│   └── Install
└── FAQ
";
        assert_eq!(render_map(&sample(), false), expected);
    }

    #[test]
    fn test_render_with_images() {
        let expected = "\
├── Home
├── guide/
│   ├── Guide
│   │   └── [image] img/flow.png (Flow)
│   └── Install
└── FAQ
";
        assert_eq!(render_map(&sample(), true), expected);
    }

    #[test]
    fn test_empty_tree_renders_nothing() {
        assert_eq!(render_map(&ContentTree::new("en", "en"), true), "");
    }
}
