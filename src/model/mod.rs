// This file is part of haarcascade, a Viola-Jones face detection engine: Haar-like
// rectangle features, AdaBoost-trained decision stumps and an attentional cascade,
// as described in the following paper:
//
//      Rapid object detection using a boosted cascade of simple features,
//      Paul Viola, Michael Jones.
//      In CVPR 2001.
//
// You can redistribute haarcascade source codes and/or modify it under the terms
// of the BSD 2-Clause License.
//
// You should have received a copy of the BSD 2-Clause License along with the software.
// If not, see < https://opensource.org/licenses/BSD-2-Clause>.

//! Binary cascade format.
//!
//! All values are little-endian:
//!
//! ```text
//! i32 canvas_width, i32 canvas_height, i32 stage_count
//! per stage:  i32 stump_count, f64 detection_threshold
//! per stump:  i32 type (1..=5), i32 x, i32 y, i32 width, i32 height,
//!             f64 threshold, i32 polarity (1 or -1), f64 vote_weight
//! ```

use std::fs::File;
use std::io::{BufWriter, Cursor, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::classifier::{BoostedEnsemble, DecisionStump, Polarity, WeightedStump};
use crate::detector::Cascade;
use crate::error::{Error, Result};
use crate::feat::{FeatureType, HaarFeature};

pub fn load_model<P: AsRef<Path>>(path: P) -> Result<Cascade> {
    let mut buf = vec![];
    File::open(path)?.read_to_end(&mut buf)?;
    ModelReader::new(Cursor::new(buf)).read()
}

pub fn read_model<R: Read>(reader: R) -> Result<Cascade> {
    ModelReader::new(reader).read()
}

pub fn save_model<P: AsRef<Path>>(cascade: &Cascade, path: P) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_model(cascade, &mut writer)?;
    writer.flush()?;
    Ok(())
}

pub fn write_model<W: Write>(cascade: &Cascade, writer: W) -> Result<()> {
    ModelWriter::new(writer).write(cascade)
}

struct ModelReader<R> {
    reader: R,
}

impl<R: Read> ModelReader<R> {
    fn new(reader: R) -> Self {
        ModelReader { reader }
    }

    fn read(mut self) -> Result<Cascade> {
        let canvas_width = self.read_dimension("canvas width")?;
        let canvas_height = self.read_dimension("canvas height")?;
        let stage_count = self.read_count("stage count")?;

        let mut cascade = Cascade::new(canvas_width, canvas_height);
        for stage in 0..stage_count {
            let stump_count = self.read_count("stump count")?;
            if stump_count == 0 {
                return Err(invalid(format!("stage {} has no stumps", stage)));
            }
            let detection_threshold = self.read_finite("detection threshold")?;

            let mut stumps = Vec::new();
            for _ in 0..stump_count {
                stumps.push(self.read_stump()?);
            }
            cascade
                .push_stage(BoostedEnsemble::from_parts(stumps, detection_threshold))
                .map_err(|e| match e {
                    Error::InvalidParameter(message) => Error::InvalidModel(message),
                    e => e,
                })?;
        }

        Ok(cascade)
    }

    fn read_stump(&mut self) -> Result<WeightedStump> {
        let type_id = self.read_i32()?;
        let kind = FeatureType::from_id(type_id)
            .ok_or_else(|| invalid(format!("unknown feature type {}", type_id)))?;
        let x = self.read_coordinate("feature x")?;
        let y = self.read_coordinate("feature y")?;
        let width = self.read_dimension("feature width")?;
        let height = self.read_dimension("feature height")?;
        let feature = HaarFeature::new(kind, x, y, width, height).ok_or_else(|| {
            invalid(format!(
                "{}x{} is not a valid size for feature type {}",
                width, height, type_id
            ))
        })?;

        let threshold = self.read_finite("stump threshold")?;
        let sign = self.read_i32()?;
        let polarity =
            Polarity::from_sign(sign).ok_or_else(|| invalid(format!("invalid polarity {}", sign)))?;
        let vote_weight = self.read_finite("vote weight")?;

        Ok(WeightedStump {
            stump: DecisionStump::new(feature, threshold, polarity),
            vote_weight,
        })
    }

    fn read_dimension(&mut self, what: &str) -> Result<u32> {
        let value = self.read_i32()?;
        if value <= 0 {
            return Err(invalid(format!("{} must be positive, got {}", what, value)));
        }
        Ok(value as u32)
    }

    fn read_coordinate(&mut self, what: &str) -> Result<u32> {
        let value = self.read_i32()?;
        if value < 0 {
            return Err(invalid(format!("{} must not be negative, got {}", what, value)));
        }
        Ok(value as u32)
    }

    fn read_count(&mut self, what: &str) -> Result<usize> {
        Ok(self.read_coordinate(what)? as usize)
    }

    fn read_finite(&mut self, what: &str) -> Result<f64> {
        let value = self.read_f64()?;
        if !value.is_finite() {
            return Err(invalid(format!("{} is not finite: {}", what, value)));
        }
        Ok(value)
    }

    fn read_i32(&mut self) -> Result<i32> {
        Ok(self.reader.read_i32::<LittleEndian>()?)
    }

    fn read_f64(&mut self) -> Result<f64> {
        Ok(self.reader.read_f64::<LittleEndian>()?)
    }
}

struct ModelWriter<W> {
    writer: W,
}

impl<W: Write> ModelWriter<W> {
    fn new(writer: W) -> Self {
        ModelWriter { writer }
    }

    fn write(mut self, cascade: &Cascade) -> Result<()> {
        self.write_u32(cascade.canvas_width())?;
        self.write_u32(cascade.canvas_height())?;
        self.write_usize(cascade.stage_count())?;

        for stage in cascade.stages() {
            self.write_usize(stage.len())?;
            self.write_f64(stage.detection_threshold())?;

            for weighted in stage.stumps() {
                let stump = &weighted.stump;
                let feature = stump.feature();
                self.write_i32(feature.kind().id())?;
                self.write_u32(feature.x())?;
                self.write_u32(feature.y())?;
                self.write_u32(feature.width())?;
                self.write_u32(feature.height())?;
                self.write_f64(stump.threshold())?;
                self.write_i32(stump.polarity().sign())?;
                self.write_f64(weighted.vote_weight)?;
            }
        }

        self.writer.flush()?;
        Ok(())
    }

    fn write_u32(&mut self, value: u32) -> Result<()> {
        let value = i32::try_from(value)
            .map_err(|_| invalid(format!("{} does not fit the model format", value)))?;
        self.write_i32(value)
    }

    fn write_usize(&mut self, value: usize) -> Result<()> {
        let value = i32::try_from(value)
            .map_err(|_| invalid(format!("{} does not fit the model format", value)))?;
        self.write_i32(value)
    }

    fn write_i32(&mut self, value: i32) -> Result<()> {
        Ok(self.writer.write_i32::<LittleEndian>(value)?)
    }

    fn write_f64(&mut self, value: f64) -> Result<()> {
        Ok(self.writer.write_f64::<LittleEndian>(value)?)
    }
}

fn invalid(message: String) -> Error {
    Error::InvalidModel(message)
}
