use std::fs;
use std::io::{BufRead, BufReader};
use std::mem;
use std::path::{Path, PathBuf};
use std::str;

use log::info;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use rayon::prelude::*;
use xz::bufread::XzDecoder;

use crate::UserConfig;
use crate::data::osm::{GeoNode, NodeId, OsmElement, Tag, Way};
use crate::data::OsmMapData;
use crate::errors::{Error, ErrorKind, Result};
use crate::etl::Etl;
use crate::ingest::Aggregator;
use crate::tiling::TileOracle;

pub const ETL_NAME: &str = "parse_osm";
pub const OUTPUT_FILE_NAME: &str = "osm_elements.rkyv";

enum ParserState {
    Top,
    Node(GeoNode),
    Way(Way),
    Relation,
}

fn missing(element: &str, attribute: &str) -> Error {
    Error::new(ErrorKind::Parse, format!("<{}> without '{}' attribute", element, attribute))
}

fn parse_node(el: &BytesStart) -> Result<GeoNode> {
    let mut id: Option<NodeId> = None;
    let mut lat: Option<f64> = None;
    let mut lon: Option<f64> = None;

    for attribute_res in el.attributes() {
        let attribute = attribute_res?;
        match attribute.key.as_ref() {
            b"id" => id = Some(str::from_utf8(&attribute.value)?.parse()?),
            b"lat" => lat = Some(str::from_utf8(&attribute.value)?.parse()?),
            b"lon" => lon = Some(str::from_utf8(&attribute.value)?.parse()?),
            _ => (),
        }
    }

    Ok(GeoNode {
        id: id.ok_or_else(|| missing("node", "id"))?,
        lat: lat.ok_or_else(|| missing("node", "lat"))?,
        lon: lon.ok_or_else(|| missing("node", "lon"))?,
        tags: Vec::new(),
    })
}

fn parse_way(el: &BytesStart) -> Result<Way> {
    for attribute_res in el.attributes() {
        let attribute = attribute_res?;
        if attribute.key.as_ref() == b"id" {
            return Ok(Way {
                id: str::from_utf8(&attribute.value)?.parse()?,
                nodes: Vec::new(),
                tags: Vec::new(),
            });
        }
    }
    Err(missing("way", "id"))
}

fn parse_tag(el: &BytesStart) -> Result<Tag> {
    let mut key: Option<String> = None;
    let mut value: Option<String> = None;
    for attribute_res in el.attributes() {
        let attribute = attribute_res?;
        match attribute.key.as_ref() {
            b"k" => key = Some(attribute.unescape_value()?.into_owned()),
            b"v" => value = Some(attribute.unescape_value()?.into_owned()),
            _ => (),
        }
    }
    Ok(Tag::new(
        key.ok_or_else(|| missing("tag", "k"))?,
        value.ok_or_else(|| missing("tag", "v"))?,
    ))
}

fn parse_node_ref(el: &BytesStart) -> Result<NodeId> {
    for attribute_res in el.attributes() {
        let attribute = attribute_res?;
        if attribute.key.as_ref() == b"ref" {
            return Ok(str::from_utf8(&attribute.value)?.parse()?);
        }
    }
    Err(missing("nd", "ref"))
}

/// Attaches `<tag>` and `<nd>` children to the element being read. Children of relations
/// are dropped.
fn add_child(state: &mut ParserState, el: &BytesStart) -> Result<()> {
    match (el.name().as_ref(), state) {
        (b"tag", ParserState::Node(node)) => node.tags.push(parse_tag(el)?),
        (b"tag", ParserState::Way(way)) => way.tags.push(parse_tag(el)?),
        (b"nd", ParserState::Way(way)) => way.nodes.push(parse_node_ref(el)?),
        _ => (),
    }
    Ok(())
}

/// Streams nodes and ways out of an `.osm` XML document.
///
/// Iteration stops after the first error.
pub struct OsmReader<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    state: ParserState,
    done: bool,
}

impl OsmReader<Box<dyn BufRead>> {
    /// Opens a plain `.osm` file, or an xz-compressed one when the name ends in `.xz`.
    pub fn open(path: &Path) -> Result<Self> {
        let file = fs::File::open(path)
            .map_err(|err| Error::new(ErrorKind::Io, format!("{}: {}", path.display(), err)))?;
        let file_reader = BufReader::new(file);
        let source: Box<dyn BufRead> = if path.extension().is_some_and(|ext| ext == "xz") {
            Box::new(BufReader::new(XzDecoder::new(file_reader)))
        } else {
            Box::new(file_reader)
        };
        Ok(Self::from_reader(source))
    }
}

impl<R: BufRead> OsmReader<R> {
    pub fn from_reader(source: R) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.trim_text(true);
        OsmReader {
            reader,
            buf: Vec::new(),
            state: ParserState::Top,
            done: false,
        }
    }

    fn next_element(&mut self) -> Result<Option<OsmElement>> {
        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf)? {
                Event::Eof => return Ok(None),
                Event::Start(e) => match e.name().as_ref() {
                    b"node" => self.state = ParserState::Node(parse_node(&e)?),
                    b"way" => self.state = ParserState::Way(parse_way(&e)?),
                    b"relation" => self.state = ParserState::Relation,
                    _ => add_child(&mut self.state, &e)?,
                },
                Event::Empty(e) => match e.name().as_ref() {
                    b"node" => return Ok(Some(OsmElement::Node(parse_node(&e)?))),
                    b"way" => return Ok(Some(OsmElement::Way(parse_way(&e)?))),
                    _ => add_child(&mut self.state, &e)?,
                },
                Event::End(e) => {
                    if matches!(e.name().as_ref(), b"node" | b"way" | b"relation") {
                        match mem::replace(&mut self.state, ParserState::Top) {
                            ParserState::Node(node) => return Ok(Some(OsmElement::Node(node))),
                            ParserState::Way(way) => return Ok(Some(OsmElement::Way(way))),
                            ParserState::Top | ParserState::Relation => (),
                        }
                    }
                },
                _ => (),
            }
        }
    }
}

impl<R: BufRead> Iterator for OsmReader<R> {
    type Item = Result<OsmElement>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_element() {
            Ok(Some(element)) => Some(Ok(element)),
            Ok(None) => {
                self.done = true;
                None
            },
            Err(err) => {
                self.done = true;
                Some(Err(err))
            },
        }
    }
}

/// Reads the element cache written by [`ParseOsmEtl`].
pub fn read_cache(dir: &Path) -> Result<OsmMapData> {
    let bytes = fs::read(dir.join(OUTPUT_FILE_NAME))?;
    let mut aligned = rkyv::AlignedVec::with_capacity(bytes.len());
    aligned.extend_from_slice(&bytes);
    rkyv::from_bytes::<OsmMapData>(aligned.as_slice())
        .map_err(|err| Error::new(ErrorKind::Cache, format!("corrupt element cache: {:?}", err)))
}

/// Parses every input file concurrently into one [`OsmMapData`] and caches it.
pub struct ParseOsmEtl<'a> {
    config: &'a UserConfig,
    oracle: &'a dyn TileOracle,
}

impl<'a> ParseOsmEtl<'a> {
    pub fn new(config: &'a UserConfig, oracle: &'a dyn TileOracle) -> Self {
        ParseOsmEtl {
            config,
            oracle,
        }
    }
}

impl Etl for ParseOsmEtl<'_> {
    type Input = Vec<PathBuf>;
    type Output = OsmMapData;

    fn etl_name(&self) -> &str {
        ETL_NAME
    }

    fn output_path(&self, dir: &Path) -> PathBuf {
        dir.join(OUTPUT_FILE_NAME)
    }

    fn extract(&mut self, _dir: &Path) -> Result<Self::Input> {
        if self.config.data_paths.is_empty() {
            return Err(Error::new(ErrorKind::Other, "no input files configured"));
        }
        self.config.data_paths.iter()
            .map(|data_path| {
                let path = PathBuf::from(data_path);
                if path.is_file() {
                    Ok(path)
                } else {
                    Err(Error::new(ErrorKind::Io, format!("input file {} not found", data_path)))
                }
            })
            .collect()
    }

    fn transform(&mut self, input: Self::Input) -> Result<Self::Output> {
        let aggregator = Aggregator::new();
        input.par_iter().try_for_each(|path| {
            aggregator.ingest(OsmReader::open(path)?)?;
            info!(
                path = &*path.to_string_lossy(),
                nodes_so_far = aggregator.node_count();
                "Read input file"
            );
            Ok::<(), Error>(())
        })?;
        aggregator.finish(self.oracle)
    }

    fn load(&mut self, dir: &Path, output: Self::Output) -> Result<()> {
        let bytes = rkyv::to_bytes::<_, 1024>(&output).map_err(|err| {
            Error::new(ErrorKind::Cache, format!("could not serialize elements: {:?}", err))
        })?;
        fs::write(self.output_path(dir), bytes.as_slice())?;
        Ok(())
    }
}
