use std::cmp::Ordering;
use std::collections::BinaryHeap;

use thiserror::Error;

pub type NodeId = usize;
pub type EdgeId = usize;
pub type LinkId = usize;

#[derive(Error,Debug,Clone,PartialEq)]
pub enum GraphError {
    #[error("network has {node_count} nodes, but node {node} was referenced")]
    NodeOutOfBounds{node_count:usize,node:NodeId},
    #[error("link {tail} -> {head} has capacity {capacity}, capacities must be finite and positive")]
    InvalidCapacity{tail:NodeId,head:NodeId,capacity:f64},
    #[error("self loop at node {node}")]
    SelfLoop{node:NodeId},
    #[error("expected {expected} edge weights, got {len}")]
    WeightLenUnmatch{expected:usize,len:usize},
}

type Result<T> = std::result::Result<T,GraphError>;

// one direction of travel over a link
#[derive(Clone,Copy,Debug,PartialEq)]
pub struct Edge {
    pub source:NodeId,
    pub target:NodeId,
    pub link:LinkId,
}

// a capacity resource, an undirected link owns two edges that share it
#[derive(Clone,Debug,PartialEq)]
pub struct Link {
    pub endpoints:(NodeId,NodeId),
    pub capacity:f64,
    pub directed:bool,
    pub edges:Vec<EdgeId>,
}

/// Static, capacitated topology. Nodes are `0..node_count`.
///
/// Routing and flows are indexed by [`EdgeId`], utilization by [`LinkId`].
#[derive(Clone,Debug)]
pub struct Network {
    name:String,
    node_count:usize,
    edges:Vec<Edge>,
    links:Vec<Link>,
    out_edges:Vec<Vec<EdgeId>>,
    in_edges:Vec<Vec<EdgeId>>,
}

impl Network {
    pub fn new(name:impl Into<String>,node_count:usize) -> Self {
        Self {
            name:name.into(),
            node_count,
            edges:vec![],
            links:vec![],
            out_edges:vec![vec![];node_count],
            in_edges:vec![vec![];node_count],
        }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn node_count(&self) -> usize {
        self.node_count
    }
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
    pub fn link_count(&self) -> usize {
        self.links.len()
    }
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }
    pub fn edge(&self,edge:EdgeId) -> Option<&Edge> {
        self.edges.get(edge)
    }
    pub fn links(&self) -> &[Link] {
        &self.links
    }
    pub fn link(&self,link:LinkId) -> Option<&Link> {
        self.links.get(link)
    }
    pub fn out_edges(&self,node:NodeId) -> &[EdgeId] {
        self.out_edges.get(node).map(|e| e.as_slice()).unwrap_or(&[])
    }
    pub fn in_edges(&self,node:NodeId) -> &[EdgeId] {
        self.in_edges.get(node).map(|e| e.as_slice()).unwrap_or(&[])
    }

    fn check_endpoints(&self,source:NodeId,target:NodeId,capacity:f64) -> Result<()> {
        for node in [source,target] {
            if node >= self.node_count {
                return Err(GraphError::NodeOutOfBounds { node_count: self.node_count, node })
            }
        }
        if source == target {
            return Err(GraphError::SelfLoop { node: source })
        }
        if !capacity.is_finite() || capacity <= 0.0 {
            return Err(GraphError::InvalidCapacity { tail: source, head: target, capacity })
        }
        Ok(())
    }
    fn push_edge(&mut self,source:NodeId,target:NodeId,link:LinkId) -> EdgeId {
        let id = self.edges.len();
        self.edges.push(Edge { source, target, link });
        self.out_edges[source].push(id);
        self.in_edges[target].push(id);
        id
    }

    /// Adds a one-way link, returns its id.
    pub fn add_directed_link(&mut self,source:NodeId,target:NodeId,capacity:f64) -> Result<LinkId> {
        self.check_endpoints(source, target, capacity)?;
        let link = self.links.len();
        let edge = self.push_edge(source, target, link);
        self.links.push(Link { endpoints: (source,target), capacity, directed: true, edges: vec![edge] });
        Ok(link)
    }

    /// Adds a bidirectional link. Both directions draw on the same capacity.
    pub fn add_link(&mut self,a:NodeId,b:NodeId,capacity:f64) -> Result<LinkId> {
        self.check_endpoints(a, b, capacity)?;
        let link = self.links.len();
        let forward = self.push_edge(a, b, link);
        let backward = self.push_edge(b, a, link);
        self.links.push(Link { endpoints: (a,b), capacity, directed: false, edges: vec![forward,backward] });
        Ok(link)
    }

    // Dijkstra over reversed edges, distance from every node to `destination`.
    // Unreachable nodes get f64::INFINITY. Weights must be non-negative.
    pub fn distances_to(&self,destination:NodeId,weights:&[f64]) -> Result<Vec<f64>> {
        self.shortest_paths_to(destination, weights).map(|paths| paths.dist)
    }

    /// Distances plus the shortest path tree toward `destination`.
    ///
    /// A node's tree edge leads to a node settled strictly before it, even
    /// when a tiny weight makes both distances round to the same value.
    pub fn shortest_paths_to(&self,destination:NodeId,weights:&[f64]) -> Result<ShortestPaths> {
        if destination >= self.node_count {
            return Err(GraphError::NodeOutOfBounds { node_count: self.node_count, node: destination })
        }
        if weights.len() != self.edges.len() {
            return Err(GraphError::WeightLenUnmatch { expected: self.edges.len(), len: weights.len() })
        }
        let mut dist = vec![f64::INFINITY;self.node_count];
        let mut next_hop = vec![None;self.node_count];
        let mut heap = BinaryHeap::with_capacity(self.node_count);
        dist[destination] = 0.0;
        heap.push(Candidate { dist: 0.0, node: destination });
        while let Some(Candidate { dist: d, node }) = heap.pop() {
            if d > dist[node] {continue}
            for &edge in self.in_edges(node) {
                let prev = self.edges[edge].source;
                let through = d + weights[edge];
                if through < dist[prev] {
                    dist[prev] = through;
                    next_hop[prev] = Some(edge);
                    heap.push(Candidate { dist: through, node: prev });
                }
            }
        }
        Ok(ShortestPaths { dist, next_hop })
    }

    pub fn hop_distances_to(&self,destination:NodeId) -> Result<Vec<f64>> {
        self.distances_to(destination, &vec![1.0;self.edges.len()])
    }
}

pub struct ShortestPaths {
    pub dist:Vec<f64>,
    /// Edge each node leaves by, `None` at the destination and at
    /// unreachable nodes.
    pub next_hop:Vec<Option<EdgeId>>,
}

// min-heap entry
#[derive(Clone,Copy,PartialEq)]
struct Candidate {
    dist:f64,
    node:NodeId,
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other.dist.total_cmp(&self.dist).then_with(|| self.node.cmp(&other.node))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
