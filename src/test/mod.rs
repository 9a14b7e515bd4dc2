mod alumnos;
mod areas;
mod cursos;
mod lecciones;
