use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use thiserror::Error;

use super::{
    camera::Camera,
    core::{Light, Scene, SceneObject},
    material::{Mapping, Material, Pattern},
    solid::{Cone, Cylinder, Plane, Solid, Sphere},
    texture::Texture,
    tracer::{Fog, TraceSettings},
    Vec3,
};

pub struct SceneParser<'a> {
    content: &'a str,
    buffer: String,
    position: FilePosition,
    base_dir: PathBuf,
    texture_names: HashMap<String, usize>,
    textures: Vec<Texture>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilePosition {
    pub line: u32,
    pub column: u32,
    index: u32,
}

impl FilePosition {
    fn new() -> Self {
        FilePosition {
            line: 0,
            column: 0,
            index: 0,
        }
    }

    fn on_new_line(self: &mut Self) {
        self.line += 1;
        self.column = 0;
        self.index += 1;
    }

    fn advance(self: &mut Self) {
        self.column += 1;
        self.index += 1;
    }
}

#[derive(Debug, Error)]
#[error("{message} at {}:{}", .position.line + 1, .position.column + 1)]
pub struct ParserError {
    pub position: FilePosition,
    pub message: String,
}

impl ParserError {
    fn new(message: &str, position: FilePosition) -> ParserError {
        ParserError {
            position,
            message: message.to_string(),
        }
    }

    pub fn print_error_location(self: &Self, content: &str) {
        eprintln!("{}", self);
        if let Some(line) = content.lines().nth(self.position.line as usize) {
            eprintln!("{}", line);
            let spacing = " ".repeat(self.position.column as usize);
            eprintln!("{}^", spacing);
        }
    }
}

type ParserResult<T> = Result<T, ParserError>;

#[derive(Debug)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub camera: Camera,
    pub scene: Scene,
    pub settings: TraceSettings,
}

impl SceneParser<'_> {
    pub fn new<'a>(content: &'a str) -> SceneParser<'a> {
        SceneParser {
            content,
            position: FilePosition::new(),
            buffer: "".to_string(),
            base_dir: PathBuf::new(),
            texture_names: HashMap::new(),
            textures: Vec::new(),
        }
    }

    /// Directory texture paths are relative to, usually the one holding the scene file.
    pub fn with_base_dir(mut self, base_dir: &Path) -> Self {
        self.base_dir = base_dir.to_path_buf();
        self
    }

    fn get_current_char(self: &Self) -> Option<char> {
        self.content.chars().nth(self.position.index as usize)
    }

    fn advance(self: &mut Self) -> bool {
        if let Some(current_char) = self.get_current_char() {
            if current_char == '\n' {
                self.position.on_new_line();
            } else {
                self.position.advance();
            }
            return true;
        }
        return false;
    }

    fn advance_until(self: &mut Self, f: impl Fn(char) -> bool) {
        while let Some(current_char) = self.get_current_char() {
            if f(current_char) {
                break;
            }
            self.advance();
        }
    }

    fn eat_spaces(self: &mut Self) {
        // consume all the empty lines, spaces and comments before the next token
        while let Some(current_char) = self.get_current_char() {
            // comments
            if current_char == '#' {
                // consume the characters until the end of the line
                // note: we don't consume the end-of-line here but at the end of the loop
                self.advance_until(|c| c == '\n');
            } else if !current_char.is_whitespace() {
                break;
            }
            self.advance();
        }
    }

    fn pop(self: &mut Self) -> String {
        // check if we already peeked without eating the next token
        if !self.buffer.is_empty() {
            return std::mem::take(&mut self.buffer);
        }

        self.eat_spaces();
        let mut result = String::new();
        let Some(mut current_char) = self.get_current_char() else {
            return result;
        };
        // add the current char to the result string and advance
        let enqueque = move |parser: &mut SceneParser, result: &mut String| {
            if let Some(current_char) = parser.get_current_char() {
                result.push(current_char);
                parser.advance();
            }
            if let Some(next_char) = parser.get_current_char() {
                return next_char;
            }
            return ' ';
        };

        match current_char {
            // if char is a symbol return it
            ',' | '(' | ')' => {
                self.advance();
                result.push(current_char);
            }
            '"' => {
                enqueque(self, &mut result);
                // do not handle escape for now
                let mut in_string = true;
                loop {
                    current_char = enqueque(self, &mut result);
                    // eat also the last quote of the string
                    if !in_string || self.get_current_char().is_none() {
                        break;
                    }
                    in_string = current_char != '"';
                }
            }
            // float parsing
            '.' | '+' | '-' | '0'..='9' => {
                if current_char == '+' || current_char == '-' {
                    current_char = enqueque(self, &mut result);
                }

                while current_char.is_ascii_digit() {
                    current_char = enqueque(self, &mut result);
                }

                if current_char == '.' {
                    current_char = enqueque(self, &mut result);
                    while current_char.is_ascii_digit() {
                        current_char = enqueque(self, &mut result);
                    }
                }
            }
            c if c.is_alphabetic() => {
                while current_char.is_alphabetic() {
                    current_char = enqueque(self, &mut result);
                }
            }
            // any other character is a token on its own, so it can be reported
            _ => {
                enqueque(self, &mut result);
            }
        }
        return result;
    }

    fn peek(self: &mut Self) -> &String {
        // peek always look ahead and save the result to the buffer
        if self.buffer.is_empty() {
            self.buffer = self.pop();
        }
        return &self.buffer;
    }

    fn error<T>(self: &mut Self, message: &str) -> ParserResult<T> {
        Err(ParserError::new(message, self.position))
    }

    fn parse_float(self: &mut Self) -> ParserResult<f64> {
        let next_token = self.pop();
        if let Ok(num) = next_token.parse::<f64>() {
            Ok(num)
        } else {
            let message = format!("cannot interpret '{}' as a number", next_token);
            self.error(&message)
        }
    }

    fn parse_positive(self: &mut Self, what: &str) -> ParserResult<f64> {
        let value = self.parse_float()?;
        if value > 0.0 {
            Ok(value)
        } else {
            let message = format!("{} must be positive, got {}", what, value);
            self.error(&message)
        }
    }

    fn parse_count(self: &mut Self, what: &str) -> ParserResult<u32> {
        let value = self.parse_positive(what)?;
        if value.fract() != 0.0 || value > u32::MAX as f64 {
            let message = format!("{} must be a whole number, got {}", what, value);
            return self.error(&message);
        }
        Ok(value as u32)
    }

    fn parse_coefficient(self: &mut Self, flag: &str) -> ParserResult<f64> {
        let value = self.parse_float()?;
        if !(0.0..=1.0).contains(&value) {
            warn!(
                "{} coefficient {} at line {} is outside [0, 1], clamping it",
                flag,
                value,
                self.position.line + 1
            );
        }
        Ok(value.clamp(0.0, 1.0))
    }

    fn parse_word(self: &mut Self) -> ParserResult<String> {
        let next_token = self.pop();
        if next_token.starts_with(char::is_alphabetic) {
            Ok(next_token)
        } else {
            let message = format!("expected a name, getting '{}' instead", next_token);
            self.error(&message)
        }
    }

    fn match_token(self: &mut Self, expected_lexem: &str) -> ParserResult<()> {
        // match primitive: consume a lexem from the list and if is different
        // from the expected one raise an error
        let next_lexem = self.pop();
        if next_lexem != expected_lexem {
            let message = format!(
                "expected '{}', getting '{}' instead",
                expected_lexem, next_lexem
            );
            self.error(&message)
        } else {
            Ok(())
        }
    }

    fn maybe_match(self: &mut Self, expected_lexem: &str) -> bool {
        // variant of match that can fail
        // if the expected lexem is the next in the stream, we consume it and returns true.
        // return false otherwise leaving the stream untouched
        let next_lexem = self.peek();
        if *next_lexem == expected_lexem {
            self.pop();
            return true;
        }
        return false;
    }

    fn parse_header(self: &mut Self) -> ParserResult<(u32, u32)> {
        self.match_token("size")?;
        let width = self.parse_count("image width")?;
        let height = self.parse_count("image height")?;
        Ok((width, height))
    }

    fn parse_vec3(self: &mut Self) -> ParserResult<Vec3> {
        self.match_token("(")?;
        let x = self.parse_float()?;
        self.match_token(",")?;
        let y = self.parse_float()?;
        self.match_token(",")?;
        let z = self.parse_float()?;
        self.match_token(")")?;
        return Ok(Vec3::new(x, y, z));
    }

    fn named_color(name: &str) -> Option<Vec3> {
        let color = match name {
            "red" => Vec3::new(1.0, 0.0, 0.0),
            "blue" => Vec3::new(0.0, 0.0, 1.0),
            "green" => Vec3::new(0.0, 1.0, 0.0),
            "white" => Vec3::new(1.0, 1.0, 1.0),
            "black" => Vec3::new(0.0, 0.0, 0.0),
            "cyan" => Vec3::new(0.0, 1.0, 1.0),
            "violet" => Vec3::new(1.0, 0.0, 1.0),
            "fuchsia" => Vec3::new(0.96, 0.0, 0.96),
            "yellow" => Vec3::new(1.0, 1.0, 0.0),
            "orange" => Vec3::new(0.98, 0.45, 0.02),
            _ => return None,
        };
        Some(color)
    }

    fn peek_is_color(self: &mut Self) -> bool {
        let next_token = self.peek();
        next_token == "(" || Self::named_color(next_token).is_some()
    }

    fn parse_color(self: &mut Self) -> ParserResult<Vec3> {
        // predefined color
        let predefined = Self::named_color(self.peek());
        if let Some(color) = predefined {
            self.pop();
            return Ok(color);
        }
        self.parse_vec3()
    }

    fn parse_mapping(self: &mut Self) -> ParserResult<Mapping> {
        if self.maybe_match("spherical") {
            Ok(Mapping::Spherical)
        } else if self.maybe_match("planar") {
            let origin_x = self.parse_float()?;
            let origin_y = self.parse_float()?;
            let width = self.parse_positive("texture width")?;
            let height = self.parse_positive("texture height")?;
            Ok(Mapping::Planar {
                origin_x,
                origin_y,
                width,
                height,
            })
        } else {
            let message = format!(
                "expected 'spherical' or 'planar', getting '{}' instead",
                self.pop()
            );
            self.error(&message)
        }
    }

    fn parse_material(self: &mut Self) -> ParserResult<Material> {
        let line = self.position.line + 1;
        let color = self.parse_color()?;
        let mut material = Material::new(color);
        loop {
            let next_token = self.peek().clone();
            material = match next_token.as_str() {
                "reflective" => {
                    self.pop();
                    let coefficient = self.parse_coefficient("reflection")?;
                    material.reflective(coefficient)
                }
                "refractive" => {
                    self.pop();
                    let coefficient = self.parse_coefficient("refraction")?;
                    let index = self.parse_positive("refractive index")?;
                    material.refractive(coefficient, index)
                }
                "transparent" => {
                    self.pop();
                    let coefficient = self.parse_coefficient("transparency")?;
                    material.transparent(coefficient)
                }
                "matte" => {
                    self.pop();
                    material.matte()
                }
                "stripes" => {
                    self.pop();
                    let width = self.parse_positive("stripe width")?;
                    let even = self.parse_color()?;
                    let odd = self.parse_color()?;
                    material.with_pattern(Pattern::Stripes { width, even, odd })
                }
                "textured" => {
                    self.pop();
                    let name = self.parse_word()?;
                    let texture = match self.texture_names.get(&name).copied() {
                        Some(texture) => texture,
                        None => {
                            let message = format!("unknown texture '{}'", name);
                            return self.error(&message);
                        }
                    };
                    let mapping = self.parse_mapping()?;
                    material.with_pattern(Pattern::Texture { texture, mapping })
                }
                _ => break,
            };
        }
        if material.recursive_flags() > 1 {
            warn!(
                "material at line {} sets several of reflective/refractive/transparent, \
                 only the first in that order is used",
                line
            );
        }
        Ok(material)
    }

    fn parse_sphere(self: &mut Self) -> ParserResult<SceneObject> {
        self.match_token("sphere")?;
        let center = self.parse_vec3()?;
        let radius = self.parse_positive("sphere radius")?;
        let material = self.parse_material()?;
        Ok(SceneObject::new(
            Solid::Sphere(Sphere::new(center, radius)),
            material,
        ))
    }

    fn parse_plane(self: &mut Self) -> ParserResult<SceneObject> {
        self.match_token("plane")?;
        let a = self.parse_vec3()?;
        let b = self.parse_vec3()?;
        let c = self.parse_vec3()?;
        let d = self.parse_vec3()?;
        if (c - b).cross(a - b).squared_len() == 0.0 {
            return self.error("degenerate plane: its first three vertices are collinear");
        }
        let material = self.parse_material()?;
        Ok(SceneObject::new(Solid::Plane(Plane::new(a, b, c, d)), material))
    }

    fn parse_cone(self: &mut Self) -> ParserResult<SceneObject> {
        self.match_token("cone")?;
        let center = self.parse_vec3()?;
        let radius = self.parse_positive("cone radius")?;
        let height = self.parse_positive("cone height")?;
        let material = self.parse_material()?;
        Ok(SceneObject::new(
            Solid::Cone(Cone::new(center, radius, height)),
            material,
        ))
    }

    fn parse_cylinder(self: &mut Self) -> ParserResult<SceneObject> {
        self.match_token("cylinder")?;
        let center = self.parse_vec3()?;
        let radius = self.parse_positive("cylinder radius")?;
        let height = self.parse_positive("cylinder height")?;
        let material = self.parse_material()?;
        Ok(SceneObject::new(
            Solid::Cylinder(Cylinder::new(center, radius, height)),
            material,
        ))
    }

    fn parse_string(self: &mut Self) -> ParserResult<String> {
        let next_token = self.pop();
        if next_token.len() < 2 || !next_token.starts_with('"') || !next_token.ends_with('"') {
            let message = format!("expected a quoted string, getting '{}' instead", next_token);
            return self.error(&message);
        }
        // remove quotes
        Ok(next_token[1..next_token.len() - 1].to_string())
    }

    fn parse_texture(self: &mut Self) -> ParserResult<()> {
        self.match_token("texture")?;
        let name = self.parse_word()?;
        let path = self.parse_string()?;
        let texture = Texture::load(&self.base_dir.join(&path)).or_else(|err| {
            let message = err.to_string();
            self.error(&message)
        })?;
        self.texture_names.insert(name, self.textures.len());
        self.textures.push(texture);
        Ok(())
    }

    fn parse_camera(&mut self) -> ParserResult<Camera> {
        if !self.maybe_match("camera") {
            return Ok(Camera::default());
        }
        let mut position = Vec3::zero();
        if self.maybe_match("from") {
            position = self.parse_vec3()?;
        }
        let point = if self.maybe_match("to") {
            self.parse_vec3()?
        } else {
            position - Vec3::z_axis()
        };
        if (point - position).squared_len() == 0.0 {
            return self.error("camera target must differ from its position");
        }
        let mut camera = Camera::look_at(position, point);
        if self.maybe_match("view") {
            let width = self.parse_positive("view plane width")?;
            let height = self.parse_positive("view plane height")?;
            let distance = self.parse_positive("view plane distance")?;
            camera = camera.with_view_plane(width, height, distance);
        }
        Ok(camera)
    }

    fn parse_fog(self: &mut Self) -> ParserResult<Fog> {
        self.match_token("fog")?;
        let near = self.parse_float()?;
        let far = self.parse_float()?;
        if near == far {
            return self.error("fog needs distinct near and far planes");
        }
        let color = if self.peek_is_color() {
            self.parse_color()?
        } else {
            Vec3::one()
        };
        Ok(Fog { near, far, color })
    }

    fn parse_light(self: &mut Self) -> ParserResult<Light> {
        self.match_token("light")?;
        let position = self.parse_vec3()?;
        return Ok(Light::new(position));
    }

    pub fn parse_scene(self: &mut Self) -> ParserResult<ImageData> {
        // main routine that parse the whole file
        let (width, height) = self.parse_header()?;
        let camera = self.parse_camera()?;

        let mut settings = TraceSettings::default();
        let mut objects = Vec::new();
        let mut lights = Vec::new();
        loop {
            let next_token = self.peek().clone();
            match next_token.as_str() {
                "" => break,
                "light" => {
                    let light = self.parse_light()?;
                    lights.push(light);
                }
                "texture" => self.parse_texture()?,
                "sphere" => objects.push(self.parse_sphere()?),
                "plane" => objects.push(self.parse_plane()?),
                "cone" => objects.push(self.parse_cone()?),
                "cylinder" => objects.push(self.parse_cylinder()?),
                "depth" => {
                    self.pop();
                    settings.max_depth = self.parse_count("recursion depth")?;
                }
                "background" => {
                    self.pop();
                    settings.background = self.parse_color()?;
                }
                "fog" => settings.fog = Some(self.parse_fog()?),
                "nofog" => {
                    self.pop();
                    settings.fog = None;
                }
                _ => {
                    let message = format!("unexpected token '{}'", next_token);
                    return self.error(&message);
                }
            }
        }
        if lights.is_empty() {
            lights = Light::default_pair();
        }
        debug!(
            "parsed scene: {} objects, {} lights, {} textures",
            objects.len(),
            lights.len(),
            self.textures.len()
        );

        let mut scene = Scene::new(objects, lights);
        scene.textures = std::mem::take(&mut self.textures);
        Ok(ImageData {
            width,
            height,
            camera,
            scene,
            settings,
        })
    }
}
