use crate::ir::{Edge, NodeKind};
use thiserror::Error;

/// Why a proposed edge was refused. Variants are listed in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum RejectReason {
    #[error("source and target are required")]
    SourceTargetRequired,
    #[error("self-loop is blocked in editor")]
    SelfLoopBlocked,
    #[error("sink cannot have outgoing edges")]
    SinkOutgoingBlocked,
    #[error("source cannot have incoming edges")]
    SourceIncomingBlocked,
    #[error("duplicate edge")]
    DuplicateEdgeBlocked,
}

impl RejectReason {
    pub fn code(self) -> &'static str {
        match self {
            Self::SourceTargetRequired => "source_target_required",
            Self::SelfLoopBlocked => "self_loop_blocked",
            Self::SinkOutgoingBlocked => "sink_outgoing_blocked",
            Self::SourceIncomingBlocked => "source_incoming_blocked",
            Self::DuplicateEdgeBlocked => "duplicate_edge_blocked",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ConnectionRequest<'a> {
    pub source_id: &'a str,
    pub target_id: &'a str,
    pub source_kind: NodeKind,
    pub target_kind: NodeKind,
    pub existing_edges: &'a [Edge],
    pub candidate: &'a Edge,
}

/// Decide whether `candidate` may be added. Pure; the caller applies the edge.
pub fn check_connection(req: &ConnectionRequest<'_>) -> Result<(), RejectReason> {
    let source_id = req.source_id.trim();
    let target_id = req.target_id.trim();
    if source_id.is_empty() || target_id.is_empty() {
        return Err(RejectReason::SourceTargetRequired);
    }
    if source_id == target_id {
        return Err(RejectReason::SelfLoopBlocked);
    }
    if !req.source_kind.accepts_outgoing() {
        return Err(RejectReason::SinkOutgoingBlocked);
    }
    if !req.target_kind.accepts_incoming() {
        return Err(RejectReason::SourceIncomingBlocked);
    }
    if is_duplicate_edge(req.existing_edges, req.candidate) {
        return Err(RejectReason::DuplicateEdgeBlocked);
    }
    Ok(())
}

/// Exact match on endpoints and ports, an absent port equal to an empty one.
pub fn is_duplicate_edge(existing: &[Edge], candidate: &Edge) -> bool {
    existing.iter().any(|edge| {
        edge.src == candidate.src
            && edge.dst == candidate.dst
            && port(&edge.src_port) == port(&candidate.src_port)
            && port(&edge.dst_port) == port(&candidate.dst_port)
    })
}

fn port(p: &Option<String>) -> &str {
    p.as_deref().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request<'a>(
        source_id: &'a str,
        target_id: &'a str,
        source_kind: NodeKind,
        target_kind: NodeKind,
        existing_edges: &'a [Edge],
        candidate: &'a Edge,
    ) -> ConnectionRequest<'a> {
        ConnectionRequest {
            source_id,
            target_id,
            source_kind,
            target_kind,
            existing_edges,
            candidate,
        }
    }

    #[test]
    fn allows_plain_connection() {
        let candidate = Edge::new("node_a", "node_b");
        let req = request("node_a", "node_b", NodeKind::Node, NodeKind::Node, &[], &candidate);
        assert_eq!(check_connection(&req), Ok(()));
    }

    #[test]
    fn blocks_sink_outgoing_and_source_incoming() {
        let candidate = Edge::new("sink_1", "node_1");
        let req = request("sink_1", "node_1", NodeKind::Sink, NodeKind::Node, &[], &candidate);
        assert_eq!(check_connection(&req), Err(RejectReason::SinkOutgoingBlocked));

        let candidate = Edge::new("node_1", "source_1");
        let req = request("node_1", "source_1", NodeKind::Node, NodeKind::Source, &[], &candidate);
        assert_eq!(check_connection(&req), Err(RejectReason::SourceIncomingBlocked));
    }

    #[test]
    fn blocks_self_loop_and_exact_duplicate() {
        let candidate = Edge::new("n1", "n1");
        let req = request("n1", "n1", NodeKind::Node, NodeKind::Node, &[], &candidate);
        assert_eq!(check_connection(&req), Err(RejectReason::SelfLoopBlocked));

        let existing = vec![Edge::new("n1", "n2").with_ports(Some("out"), Some("in"))];
        let candidate = Edge::new("n1", "n2").with_ports(Some("out"), Some("in"));
        assert!(is_duplicate_edge(&existing, &candidate));
        let req = request("n1", "n2", NodeKind::Node, NodeKind::Node, &existing, &candidate);
        assert_eq!(check_connection(&req), Err(RejectReason::DuplicateEdgeBlocked));
        assert_eq!(RejectReason::DuplicateEdgeBlocked.code(), "duplicate_edge_blocked");
    }

    #[test]
    fn different_ports_are_not_duplicates() {
        let existing = vec![Edge::new("n1", "n2")];
        let candidate = Edge::new("n1", "n2").with_ports(Some("alt"), None);
        assert!(!is_duplicate_edge(&existing, &candidate));
        let unqualified = Edge {
            src_port: Some(String::new()),
            ..Edge::new("n1", "n2")
        };
        assert!(is_duplicate_edge(&existing, &unqualified));
    }

    #[test]
    fn first_failing_rule_wins() {
        let candidate = Edge::new("", "x");
        let req = request(" ", "x", NodeKind::Sink, NodeKind::Source, &[], &candidate);
        assert_eq!(check_connection(&req), Err(RejectReason::SourceTargetRequired));

        let candidate = Edge::new("s", "s");
        let req = request("s", "s", NodeKind::Sink, NodeKind::Source, &[], &candidate);
        assert_eq!(check_connection(&req), Err(RejectReason::SelfLoopBlocked));

        let candidate = Edge::new("a", "b");
        let req = request("a", "b", NodeKind::Sink, NodeKind::Source, &[], &candidate);
        assert_eq!(check_connection(&req).unwrap_err().code(), "sink_outgoing_blocked");
    }

    #[test]
    fn unknown_kind_text_passes_through() {
        let candidate = Edge::new("a", "b");
        let req = request(
            "a",
            "b",
            NodeKind::parse("filter"),
            NodeKind::parse(""),
            &[],
            &candidate,
        );
        assert!(check_connection(&req).is_ok());
    }
}
