type HashMap<K,V> = std::collections::hash_map::HashMap<K,V,nohash::BuildNoHashHasher<usize>>;
type HashSet<K> = std::collections::hash_set::HashSet<K,nohash::BuildNoHashHasher<usize>>;

#[derive(Clone,Default)]
struct Neighbours {
    to:HashSet<usize>,
    from:HashSet<usize>,
}

struct InDegreeMaps {
    nonzero:HashMap<usize,usize>,
    zeros:HashSet<usize>,
    visited:HashSet<usize>
}

impl InDegreeMaps {
    fn is_finished(&self) -> bool {
        self.nonzero.is_empty() && self.zeros.is_empty()
    }

    // move `node` into visited and lower the in degree of everything it points to
    fn visit_and_change_degree(&mut self, node:usize, graph:&ForwardingGraph) {
        if self.visited.contains(&node) {
            return;
        }
        self.nonzero.remove(&node);
        self.zeros.remove(&node);
        self.visited.insert(node);

        for next in graph.nodes[node].to.iter() {
            if self.visited.contains(next) {
                continue
            }
            // not visited and pointed to, so it still has a nonzero in degree
            let Some(degree) = self.nonzero.get_mut(next) else {continue};
            if *degree > 1 {
                *degree -= 1;
            } else {
                self.nonzero.remove(next);
                self.zeros.insert(*next);
            }
        }
    }

    fn start_nodes(&self) -> Vec<usize> {
        let mut layer:Vec<usize> = self.zeros.iter().copied().collect();
        layer.sort_unstable();
        layer
    }
}

impl From<&ForwardingGraph> for InDegreeMaps {
    fn from(value: &ForwardingGraph) -> Self {
        let len = value.nodes.len();
        let mut nonzero = HashMap::with_capacity_and_hasher(len, nohash::BuildNoHashHasher::default());
        let mut zeros = HashSet::with_capacity_and_hasher(len, nohash::BuildNoHashHasher::default());
        for (node,neighbours) in value.nodes.iter().enumerate() {
            if neighbours.from.is_empty() {
                zeros.insert(node);
            } else {
                nonzero.insert(node,neighbours.from.len());
            }
        }
        Self {nonzero,zeros,visited:HashSet::with_capacity_and_hasher(
            len, nohash::BuildNoHashHasher::default()
        )}
    }
}

pub type Layers = Vec<Vec<usize>>;

/// Node level next-hop graph for one destination.
///
/// Parallel edges between the same pair collapse into one adjacency.
#[derive(Clone)]
pub struct ForwardingGraph {
    edges_len:usize,
    nodes:Vec<Neighbours>
}

impl ForwardingGraph {
    pub fn with_nodes(node_count:usize) -> Self {
        Self {edges_len:0,nodes:vec![Neighbours::default();node_count]}
    }
    pub fn nodes_len(&self) -> usize {
        self.nodes.len()
    }
    pub fn edges_len(&self) -> usize {
        self.edges_len
    }
    // out of range endpoints are ignored
    pub fn push_pair(&mut self,start:usize,end:usize) {
        if start >= self.nodes.len() || end >= self.nodes.len() {
            debug_assert!(false,"pair {start} -> {end} outside {} nodes",self.nodes.len());
            return;
        }
        if self.nodes[start].to.insert(end) {
            self.nodes[end].from.insert(start);
            self.edges_len += 1;
        }
    }

    /// Kahn's algorithm, one layer per round of zero in degree nodes.
    ///
    /// On a cycle returns the layers sorted so far and the nodes that never
    /// reached zero in degree, sorted.
    pub fn topological_sort(&self) -> Result<Layers,(Layers,Vec<usize>)> {
        let mut degree_map:InDegreeMaps = self.into();
        let mut layers = Vec::with_capacity(self.nodes_len());
        while !degree_map.is_finished() {
            let current_layer = degree_map.start_nodes();
            if current_layer.is_empty() {
                let mut stuck:Vec<usize> = degree_map.nonzero.keys().copied().collect();
                stuck.sort_unstable();
                return Err((layers,stuck))
            }
            for node in current_layer.iter() {
                degree_map.visit_and_change_degree(*node, self);
            }
            layers.push(current_layer)
        }
        layers.shrink_to_fit();
        Ok(layers)
    }
}

#[cfg(test)]
mod tests{
    use super::ForwardingGraph;

    fn graph(n:usize,edges:&[(usize,usize)]) -> ForwardingGraph {
        let mut g = ForwardingGraph::with_nodes(n);
        for (a,b) in edges {
            g.push_pair(*a, *b);
        }
        g
    }

    #[test]
    fn test_layers() {
        let g = graph(5,&[(0,2),(1,2),(2,3),(0,3)]);
        let layers = g.topological_sort().unwrap();
        assert_eq!(layers,vec![vec![0,1,4],vec![2],vec![3]]);
    }

    #[test]
    fn test_duplicate_pairs_collapse() {
        let g = graph(2,&[(0,1),(0,1)]);
        assert_eq!(g.edges_len(),1);
        assert_eq!(g.topological_sort().unwrap(),vec![vec![0],vec![1]]);
    }

    #[test]
    fn test_layer_cycle() {
        let edges = [(1,3),(1,4),(2,4),(2,5),(3,6),(4,6),(7,4),(5,8),(6,9),(9,7),(8,9)];
        let g = graph(10,&edges);
        let (layers,stuck) = g.topological_sort().unwrap_err();
        assert_eq!(layers[0],vec![0,1,2]);
        // 4 -> 6 -> 9 -> 7 -> 4 never clears
        for node in [4,6,7,9] {
            assert!(stuck.contains(&node));
        }
    }
}
