pub mod draw_map;
pub mod parse_osm;
pub mod semantic_map;

use std::{fs, io::{self, Write}, path::{Path, PathBuf}};
use log::{info, error};

use crate::config::RenderConfig;
use crate::convert::{self, Conversion, ConversionReport};
use crate::data::osm::OsmMapData;
use crate::errors::Result;


pub trait Etl {
    type Input;
    type Output;

    fn etl_name(&self) -> &str;

    fn extract(&mut self) -> Result<Self::Input>;
    fn transform(&mut self, input: Self::Input) -> Result<Self::Output>;
    fn load(&mut self, output: Self::Output) -> Result<()>;

    fn process(&mut self) -> Result<()> {
        info!(etl_name = self.etl_name(); "Starting ETL process");

        info!(etl_name = self.etl_name(); "Extracting");
        let input = match self.extract() {
            Ok(input) => Ok(input),
            Err(err) => {
                error!(etl_name = self.etl_name(), err = err.message.as_str(); "Extraction failed with error");
                Err(err)
            },
        }?;

        info!(etl_name = self.etl_name(); "Transforming");
        let output = match self.transform(input) {
            Ok(output) => Ok(output),
            Err(err) => {
                error!(etl_name = self.etl_name(), err = err.message.as_str(); "Transformation failed with error");
                Err(err)
            },
        }?;

        info!(etl_name = self.etl_name(); "Loading");
        match self.load(output) {
            Ok(_) => Ok(()),
            Err(err) => {
                error!(etl_name = self.etl_name(), err = err.message.as_str(); "Loading failed with error");
                Err(err)
            },
        }?;

        info!(etl_name = self.etl_name(); "Process finished");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    File(PathBuf),
    Stdout,
}

impl OutputTarget {
    /// `-` stands for standard output.
    pub fn from_path(path: &Path) -> Self {
        if path.as_os_str() == "-" {
            OutputTarget::Stdout
        } else {
            OutputTarget::File(path.to_path_buf())
        }
    }
}

/// Export file in, SVG file out.
pub struct RoadMapEtl {
    input: PathBuf,
    output: OutputTarget,
    config: RenderConfig,
    report: Option<ConversionReport>,
}

impl RoadMapEtl {
    pub const ETL_NAME: &'static str = "road_map";

    pub fn new(input: PathBuf, output: OutputTarget, config: RenderConfig) -> Self {
        RoadMapEtl {
            input,
            output,
            config,
            report: None,
        }
    }

    /// Available once `process` has loaded the document.
    pub fn report(&self) -> Option<&ConversionReport> {
        self.report.as_ref()
    }
}

impl Etl for RoadMapEtl {
    type Input = OsmMapData;
    type Output = Conversion;

    fn etl_name(&self) -> &str {
        Self::ETL_NAME
    }

    fn extract(&mut self) -> Result<Self::Input> {
        self.config.validate()?;
        let path = self.input.display().to_string();
        info!(etl_name = parse_osm::ETL_NAME, path = path.as_str(); "Reading map export");
        parse_osm::parse_file(&self.input, self.config.max_nodes)
    }

    fn transform(&mut self, input: Self::Input) -> Result<Self::Output> {
        convert::render(input, &self.config)
    }

    fn load(&mut self, output: Self::Output) -> Result<()> {
        match &self.output {
            OutputTarget::File(path) => {
                fs::write(path, output.svg.as_bytes())?;
                let path = path.display().to_string();
                info!(
                    etl_name = self.etl_name(),
                    path = path.as_str(),
                    bytes = output.svg.len();
                    "Wrote SVG"
                );
            },
            OutputTarget::Stdout => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(output.svg.as_bytes())?;
                stdout.flush()?;
            },
        }
        self.report = Some(output.report);
        Ok(())
    }
}
