//! Edits applied to the phyphox MQTT-connector template
//!
//! Every edit locates its node by a fixed path below the root and is skipped
//! when the node is absent; a template missing a node is accepted as is.

use tracing::{debug, warn};

use crate::domain::document::{Element, XmlDocument};
use crate::domain::params::{GeneratorParams, OptionalSensor};

/// Namespace of phyphox experiment files.
pub const PHYPHOX_NAMESPACE: &str = "http://phyphox.org/xml";

pub const TITLE_PATH: &str = "title";
pub const CONNECTION_PATH: &str = "network/connection";
pub const INPUT_PATH: &str = "input";
pub const SENSOR_PATH: &str = "input/sensor";
pub const DATA_CONTAINERS_PATH: &str = "data-containers";
pub const INFO_PATH: &str = "views/view/info";

/// The three coordinated insertions that wire one optional sensor to the broker.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorBlock {
    pub container: Element,
    pub input: Element,
    pub send: Element,
}

impl SensorBlock {
    pub fn new(sensor: OptionalSensor, rate: &str) -> Self {
        let id = sensor.identifier();
        Self {
            container: Element::new("container")
                .with_attr("size", "1")
                .with_attr("static", "false")
                .with_text(id),
            input: Element::new("sensor")
                .with_attr("rate", rate)
                .with_attr("average", "false")
                .with_attr("type", sensor.type_tag())
                .with_child(Element::new("output").with_attr("component", "x").with_text(id)),
            send: Element::new("send")
                .with_attr("clear", "false")
                .with_attr("id", id)
                .with_attr("type", "buffer")
                .with_attr("datatype", "number")
                .with_text(id),
        }
    }
}

/// Which insertions of a [`SensorBlock`] found their parent node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockPlacement {
    pub container: bool,
    pub input: bool,
    pub send: bool,
}

impl BlockPlacement {
    pub fn is_complete(&self) -> bool {
        self.container && self.input && self.send
    }
}

/// A phyphox document being customized.
#[derive(Debug, Clone, PartialEq)]
pub struct PhyphoxTemplate {
    document: XmlDocument,
}

impl PhyphoxTemplate {
    pub fn new(document: XmlDocument) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &XmlDocument {
        &self.document
    }

    /// Apply every parameterized edit in order.
    pub fn customize(&mut self, params: &GeneratorParams) {
        self.set_title(&params.title());
        self.set_connection(&params.address, &params.topic, &params.interval_string());
        self.set_sensor_rates(&params.rate_string());
        self.set_info_label(&params.info_label());

        let rate = params.rate_string();
        for sensor in params.enabled_sensors() {
            let placement = self.insert_sensor_block(&SensorBlock::new(sensor, &rate));
            if !placement.is_complete() {
                warn!("{sensor} sensor block only partially inserted: {placement:?}");
            }
        }
    }

    /// Returns false if the template has no title.
    pub fn set_title(&mut self, title: &str) -> bool {
        match self.root_mut().find_mut(TITLE_PATH) {
            Some(el) => {
                el.set_text(Some(title.to_string()));
                true
            }
            None => {
                debug!("no <{TITLE_PATH}> in template, title unchanged");
                false
            }
        }
    }

    /// Returns false if the template has no connection node.
    pub fn set_connection(&mut self, address: &str, topic: &str, interval: &str) -> bool {
        match self.root_mut().find_mut(CONNECTION_PATH) {
            Some(el) => {
                el.set_attr("address", address);
                el.set_attr("sendTopic", topic);
                el.set_attr("interval", interval);
                true
            }
            None => {
                debug!("no <{CONNECTION_PATH}> in template, connection unchanged");
                false
            }
        }
    }

    /// Set the rate of every sensor present in the template; returns how many.
    pub fn set_sensor_rates(&mut self, rate: &str) -> usize {
        let sensors = self.root_mut().find_all_mut(SENSOR_PATH);
        let count = sensors.len();
        for sensor in sensors {
            sensor.set_attr("rate", rate);
        }
        debug!("set rate={rate} on {count} sensors");
        count
    }

    /// Replace any text of the info node and set its label.
    pub fn set_info_label(&mut self, label: &str) -> bool {
        match self.root_mut().find_mut(INFO_PATH) {
            Some(el) => {
                el.set_text(None);
                el.set_attr("label", label);
                true
            }
            None => {
                debug!("no <{INFO_PATH}> in template, label unchanged");
                false
            }
        }
    }

    /// Append the block's container, sensor input and send rule under their parents.
    pub fn insert_sensor_block(&mut self, block: &SensorBlock) -> BlockPlacement {
        let root = self.root_mut();
        BlockPlacement {
            container: append_under(root, DATA_CONTAINERS_PATH, &block.container),
            input: append_under(root, INPUT_PATH, &block.input),
            send: append_under(root, CONNECTION_PATH, &block.send),
        }
    }

    fn root_mut(&mut self) -> &mut Element {
        self.document.root_mut()
    }
}

fn append_under(root: &mut Element, path: &str, child: &Element) -> bool {
    match root.find_mut(path) {
        Some(parent) => {
            parent.append(child.clone());
            true
        }
        None => false,
    }
}
