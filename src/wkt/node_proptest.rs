//! Property-based tests for the WKT text tree.

#[cfg(test)]
mod proptest_tests {
    use crate::wkt::dialect::guess_dialect;
    use crate::wkt::node::{WktNode, MAX_RECURSION_LEVEL};
    use proptest::prelude::*;

    fn nested(depth: usize) -> String {
        format!("{}x{}", "A[".repeat(depth), "]".repeat(depth))
    }

    fn arb_node() -> impl Strategy<Value = WktNode> {
        let leaf = prop_oneof![
            "[A-Z][A-Z0-9_]{0,8}".prop_map(WktNode::new),
            "-?[0-9]{1,6}(\\.[0-9]{1,6})?".prop_map(WktNode::new),
            "[ -~]{0,12}".prop_map(WktNode::quoted),
        ];
        leaf.prop_recursive(4, 32, 4, |inner| {
            ("[A-Z][A-Z_]{0,8}", prop::collection::vec(inner, 1..4)).prop_map(
                |(keyword, children)| {
                    let mut node = WktNode::new(keyword);
                    for child in children {
                        node.add_child(child);
                    }
                    node
                },
            )
        })
    }

    proptest! {
        /// Property: tokenizing never panics, whatever the input
        #[test]
        fn parse_never_panics(input in ".*") {
            let _ = WktNode::parse(&input);
        }

        /// Property: dialect detection is total
        #[test]
        fn guess_dialect_never_panics(input in ".*") {
            let _ = guess_dialect(&input);
        }

        /// Property: writing a tree and reading it back gives the same tree
        #[test]
        fn display_then_parse_is_identity(node in arb_node()) {
            let text = node.to_string();
            let parsed = WktNode::parse(&text).unwrap();
            prop_assert_eq!(parsed, node);
        }

        /// Property: nesting is accepted up to the limit and rejected beyond
        #[test]
        fn nesting_limit(depth in 1usize..40) {
            let result = WktNode::parse(&nested(depth));
            if depth < MAX_RECURSION_LEVEL {
                prop_assert!(result.is_ok(), "depth {} rejected", depth);
            } else {
                prop_assert!(result.is_err(), "depth {} accepted", depth);
            }
        }
    }
}
